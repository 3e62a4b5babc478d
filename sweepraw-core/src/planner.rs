use log::info;
use sweepraw_types::{
    ConfigError, ConfigResult, FrequencyRange, SweepTable, FREQ_MAX_MHZ, MAX_SWEEP_RANGES,
};

/// Планирует таблицу sweep из пользовательских диапазонов `(min, max)` в МГц.
///
/// Верхняя граница каждого диапазона поднимается до ближайшего значения, при
/// котором ширина кратна шагу:
///
/// ```text
/// step_count   = 1 + (max - min - 1) / step
/// adjusted_max = min + step_count * step
/// ```
///
/// # Примеры
/// ```
/// use sweepraw_core::planner::plan_sweep;
///
/// let table = plan_sweep(&[(2400, 2490)], 20).unwrap();
/// assert_eq!(table.ranges()[0].end_mhz, 2500);
/// ```
pub fn plan_sweep(
    ranges: &[(u32, u32)],
    step_mhz: u32,
) -> ConfigResult<SweepTable> {
    if step_mhz == 0 {
        return Err(ConfigError::ZeroStep);
    }

    if ranges.is_empty() {
        return Err(ConfigError::NoRanges);
    }

    if ranges.len() > MAX_SWEEP_RANGES {
        return Err(ConfigError::TooManyRanges {
            count: ranges.len(),
            limit: MAX_SWEEP_RANGES,
        });
    }

    let mut planned: Vec<FrequencyRange> = Vec::with_capacity(ranges.len());

    for &(min, max) in ranges {
        let range = align_range(min, max, step_mhz)?;

        if let Some(prev) = planned.iter().find(|p| p.overlaps(&range)) {
            return Err(ConfigError::OverlappingRanges {
                first: prev.to_string(),
                second: range.to_string(),
            });
        }

        info!("Sweeping from {} MHz to {} MHz", range.start_mhz, range.end_mhz);
        planned.push(range);
    }

    Ok(SweepTable::from_planned(planned, step_mhz))
}

/// Выравнивает один диапазон по шагу перестройки.
pub fn align_range(
    min: u32,
    max: u32,
    step_mhz: u32,
) -> ConfigResult<FrequencyRange> {
    if min >= max {
        return Err(ConfigError::EmptyRange { min, max });
    }

    let step_count = 1 + (max - min - 1) / step_mhz;
    let adjusted_max = min as u64 + step_count as u64 * step_mhz as u64;

    if adjusted_max > FREQ_MAX_MHZ as u64 {
        return Err(ConfigError::RangeAboveMaximum {
            min,
            max: adjusted_max.min(u32::MAX as u64) as u32,
            limit: FREQ_MAX_MHZ,
        });
    }

    Ok(FrequencyRange::new(min, adjusted_max as u32))
}

#[cfg(test)]
mod tests {
    use sweepraw_types::TUNE_STEP_MHZ;

    use super::*;

    #[test]
    fn test_default_range_already_aligned() {
        let table = plan_sweep(&[(0, 6000)], TUNE_STEP_MHZ).unwrap();
        let r = table.ranges()[0];

        assert_eq!(r.start_mhz, 0);
        assert_eq!(r.end_mhz, 6000);
        assert_eq!(r.step_count(TUNE_STEP_MHZ), 300);
    }

    #[test]
    fn test_max_raised_to_step_multiple() {
        let r = align_range(100, 101, 20).unwrap();
        assert_eq!(r.end_mhz, 120);
        assert_eq!(r.step_count(20), 1);

        let r = align_range(2400, 2483, 20).unwrap();
        assert_eq!(r.end_mhz, 2500);
        assert_eq!((r.end_mhz - r.start_mhz) % 20, 0);
    }

    #[test]
    fn test_adjusted_max_is_smallest_aligned_value() {
        for max in 1..200u32 {
            let r = align_range(0, max, 20).unwrap();
            assert!(r.end_mhz >= max);
            assert!(r.end_mhz - max < 20, "max={max} end={}", r.end_mhz);
            assert!(r.step_count(20) >= 1);
        }
    }

    #[test]
    fn test_empty_range_rejected() {
        assert_eq!(
            align_range(100, 100, 20),
            Err(ConfigError::EmptyRange { min: 100, max: 100 })
        );
        assert!(plan_sweep(&[(200, 100)], 20).is_err());
    }

    #[test]
    fn test_adjusted_max_above_limit_rejected() {
        // 7240:7250 выравнивается до 7260 > 7250
        assert!(matches!(
            align_range(7240, 7250, 20),
            Err(ConfigError::RangeAboveMaximum { max: 7260, .. })
        ));
        assert!(align_range(7230, 7250, 20).is_ok());
        assert!(align_range(0, 8000, 20).is_err());
    }

    #[test]
    fn test_too_many_ranges_rejected() {
        let ranges: Vec<(u32, u32)> = (0..=MAX_SWEEP_RANGES as u32)
            .map(|i| (i * 100, i * 100 + 20))
            .collect();

        assert!(matches!(
            plan_sweep(&ranges, 20),
            Err(ConfigError::TooManyRanges { count: 11, .. })
        ));
        assert!(plan_sweep(&ranges[..MAX_SWEEP_RANGES], 20).is_ok());
    }

    #[test]
    fn test_overlap_and_empty_rejected() {
        assert!(matches!(
            plan_sweep(&[(0, 30), (20, 60)], 20),
            Err(ConfigError::OverlappingRanges { .. })
        ));
        assert_eq!(plan_sweep(&[], 20), Err(ConfigError::NoRanges));
        assert_eq!(plan_sweep(&[(0, 20)], 0), Err(ConfigError::ZeroStep));
    }

    #[test]
    fn test_insertion_order_preserved() {
        let table = plan_sweep(&[(900, 920), (100, 120)], 20).unwrap();
        assert_eq!(table.ranges()[0].start_mhz, 900);
        assert_eq!(table.ranges()[1].start_mhz, 100);
    }
}
