use std::{path::PathBuf, time::Instant};

use clap::Parser;
use log::{error, info, warn};
use sweepraw_core::StopReason;
use sweepraw_recorder::{
    create_device, parse_range, parse_toggle, parse_u32, DeviceKind, OutputTarget, RecorderError,
    SweepConfig, SweepPipeline,
};
use sweepraw_types::{ConfigResult, StopPolicy, SAMPLES_PER_BLOCK};

#[derive(Parser, Debug)]
#[command(
    name = "sweepraw",
    version = env!("CARGO_PKG_VERSION"),
    about = "Capture raw IQ samples from a frequency-sweeping SDR as tagged text",
    long_about = None,
)]
struct Cli {
    /// Диапазон частот min:max в МГц (до 10 раз). По умолчанию: 0:6000
    #[arg(short = 'f', long = "freq-range")]
    freq_range: Vec<String>,
    /// Выборок на одну частоту (кратно 8192)
    #[arg(short = 'n', long = "num-samples")]
    num_samples: Option<String>,
    /// Остановиться после одного полного прохода
    #[arg(short = '1', long = "one-shot")]
    one_shot: bool,
    /// Остановиться после N полных проходов
    #[arg(short = 'N', long = "num-sweeps")]
    num_sweeps: Option<String>,
    /// Усиление LNA (IF), 0-40 дБ, шаг 8
    #[arg(short = 'l', long = "lna-gain")]
    lna_gain: Option<String>,
    /// Усиление VGA (baseband), 0-62 дБ, шаг 2
    #[arg(short = 'g', long = "vga-gain")]
    vga_gain: Option<String>,
    /// Усилитель RF: 1 включить, 0 выключить
    #[arg(short = 'a', long = "amp")]
    amp: Option<String>,
    /// Питание антенны: 1 включить, 0 выключить
    #[arg(short = 'p', long = "antenna")]
    antenna: Option<String>,
    /// Серийный номер устройства
    #[arg(short = 'd', long = "serial")]
    serial: Option<String>,
    /// Выходной файл ('-' для stdout)
    #[arg(short = 'r', long = "output", default_value = "-")]
    output: OutputTarget,
    /// SDR устройство: sim, hackrf
    #[arg(long, default_value = "sim")]
    device: DeviceKind,
    /// Глубина очереди к потоку записи
    #[arg(long, default_value = "1024")]
    queue_capacity: usize,
    /// Записать итоговую сводку в JSON
    #[arg(long)]
    summary_json: Option<PathBuf>,
    /// Тихий режим (только ошибки)
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
    /// Подробный вывод
    #[arg(short, long)]
    verbose: bool,
}

fn build_config(cli: &Cli) -> ConfigResult<SweepConfig> {
    let defaults = SweepConfig::default();

    let ranges = cli
        .freq_range
        .iter()
        .map(|s| parse_range(s))
        .collect::<ConfigResult<Vec<_>>>()?;

    let num_sweeps = cli.num_sweeps.as_deref().map(parse_u32).transpose()?;

    let amp_enable = match cli.amp.as_deref() {
        Some(s) => Some(parse_toggle("amp_enable", parse_u32(s)?)?),
        None => None,
    };
    let antenna_enable = match cli.antenna.as_deref() {
        Some(s) => Some(parse_toggle("antenna_enable", parse_u32(s)?)?),
        None => None,
    };

    Ok(SweepConfig {
        device: cli.device.clone(),
        serial: cli.serial.clone(),
        ranges,
        samples_per_frequency: match cli.num_samples.as_deref() {
            Some(s) => parse_u32(s)?,
            None => SAMPLES_PER_BLOCK,
        },
        lna_gain: match cli.lna_gain.as_deref() {
            Some(s) => parse_u32(s)?,
            None => defaults.lna_gain,
        },
        vga_gain: match cli.vga_gain.as_deref() {
            Some(s) => parse_u32(s)?,
            None => defaults.vga_gain,
        },
        amp_enable,
        antenna_enable,
        stop_policy: StopPolicy::from_flags(cli.one_shot, num_sweeps)?,
        output: cli.output.clone(),
        queue_capacity: cli.queue_capacity,
        summary_path: cli.summary_json.clone(),
        ..defaults
    })
}

fn fail(e: RecorderError) -> ! {
    error!("{e}");
    std::process::exit(e.exit_code());
}

fn main() {
    let cli = Cli::parse();
    let level = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };

    env_logger::Builder::new()
        .filter_level(level.parse().unwrap_or(log::LevelFilter::Info))
        .format_target(false)
        .format_timestamp_secs()
        .init();

    let config = match build_config(&cli) {
        Ok(c) => c,
        Err(e) => fail(e.into()),
    };

    let (pipeline, metrics) = match SweepPipeline::new(config.clone()) {
        Ok(p) => p,
        Err(e) => fail(e),
    };

    let device = match create_device(&config) {
        Ok(d) => d,
        Err(e) => fail(e),
    };

    let stop = pipeline.stop_signal();
    let state = pipeline.state();

    let stop_ctrlc = stop.clone();
    let mut interrupted = false;

    if let Err(e) = ctrlc::set_handler(move || {
        if interrupted {
            // Второй Ctrl+C: принудительный выход
            warn!("Force exit");
            std::process::exit(130);
        }
        interrupted = true;
        stop_ctrlc.request(StopReason::Interrupted);
        warn!("Caught signal, draining output...");
    }) {
        warn!("Failed to set Ctrl+C handler: {e}");
    }

    // Выводим конфигурацию
    let table = pipeline.table();
    let ranges: Vec<String> = table.ranges().iter().map(|r| r.to_string()).collect();

    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("  Device        : {}", config.device);
    info!("  Ranges        : {}", ranges.join(", "));
    info!("  Steps/sweep   : {}", table.total_steps());
    info!("  Samples/freq  : {}", config.samples_per_frequency);
    info!("  LNA / VGA     : {} dB / {} dB", config.lna_gain, config.vga_gain);
    info!("  Stop policy   : {}", config.stop_policy);
    info!("  Output        : {}", config.output);
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let session_start = Instant::now();
    let result = pipeline.run(device);

    // --- Итоговая статистика ---
    let summary = metrics.summary(&session_start, &state, &stop);
    info!("\n{summary}");

    if let Some(path) = &config.summary_path {
        match summary.write_json(path) {
            Ok(()) => info!("Summary written to {}", path.display()),
            Err(e) if result.is_ok() => fail(e),
            Err(e) => warn!("Failed to write summary: {e}"),
        }
    }

    if let Err(e) = result {
        fail(e);
    }

    info!("✓ Sweep complete");
}
