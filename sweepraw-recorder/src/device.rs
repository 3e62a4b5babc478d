// Симулятор воспроизводит поведение прошивки в режиме sweep: после каждой
// перестройки первый блок несёт маркер 0x7F 0x7F и частоту, остальные блоки
// этой частоты идут без заголовка. Transfer'ы отдаются callback'у из
// собственного потока, как это делает драйвер.
// transfer_limit позволяет воспроизвести "зависание" канала: устройство
// продолжает стримить, но данных больше нет.

use std::{
    f32::consts::PI,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use log::{debug, warn};
use sweepraw_core::{encode_header, CallbackAction};
use sweepraw_types::{
    SweepTable, BLOCK_HEADER_SIZE, BYTES_PER_BLOCK, BYTES_PER_TRANSFER, SAMPLES_PER_BLOCK,
};

use crate::{DeviceKind, RecorderError, RecorderResult, SweepConfig};

/// Один transfer, отданный драйвером. Живёт только во время вызова callback.
#[derive(Debug, Clone, Copy)]
pub struct Transfer<'a> {
    pub buffer: &'a [u8],
    pub valid_length: usize,
}

/// Callback, вызываемый драйвером из своего потока.
pub type TransferCallback = Box<dyn FnMut(Transfer<'_>) -> CallbackAction + Send + 'static>;

/// Абстракция приёмника в режиме sweep.
// Реализация: [`SimulatedSweepDevice`]; драйвер HackRF подключается через
// этот же трейт.
pub trait SweepDevice: Send {
    /// Информация об устройстве
    fn info(&self) -> DeviceInfo;

    /// Частота дискретизации, фильтр, усиления, усилитель, питание антенны.
    fn configure(
        &mut self,
        settings: &DeviceSettings,
    ) -> RecorderResult<()>;

    /// Загружает таблицу sweep в устройство.
    fn plan_sweep(
        &mut self,
        table: &SweepTable,
        samples_per_frequency: u32,
        tuning_step_hz: u64,
        tuning_offset_hz: u64,
    ) -> RecorderResult<()>;

    /// Запускает стриминг. `on_transfer` вызывается из потока драйвера.
    fn start_streaming(
        &mut self,
        on_transfer: TransferCallback,
    ) -> RecorderResult<()>;

    fn is_streaming(&self) -> bool;

    /// Останавливает стриминг. После возврата callback больше не вызывается.
    fn stop(&mut self) -> RecorderResult<()>;

    fn close(&mut self) -> RecorderResult<()>;
}

/// Параметры радиочасти.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceSettings {
    pub sample_rate_hz: u32,
    pub baseband_filter_hz: u32,
    pub lna_gain: u32,
    pub vga_gain: u32,
    pub amp_enable: Option<bool>,
    pub antenna_enable: Option<bool>,
}

/// Информация об устройстве (для логирования).
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub name: String,
    pub serial: Option<String>,
}

/// Синтетический приёмник в режиме sweep.
pub struct SimulatedSweepDevice {
    /// Выдавать данные в темпе реальной частоты дискретизации
    pub pace: bool,
    /// После стольких transfer'ов данные перестают поступать
    pub transfer_limit: Option<u64>,
    serial: Option<String>,
    settings: Option<DeviceSettings>,
    plan: Option<SimPlan>,
    streaming: Arc<AtomicBool>,
    halt: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

#[derive(Debug, Clone)]
struct SimPlan {
    frequencies: Vec<u64>,
    blocks_per_frequency: usize,
}

/// Бесконечный генератор блоков по таблице частот.
struct BlockGenerator {
    plan: SimPlan,
    freq_idx: usize,
    block_idx: usize,
    phase: f32,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl SimulatedSweepDevice {
    pub fn new() -> Self {
        Self {
            pace: false,
            transfer_limit: None,
            serial: Some("SIM-SWEEP-0001".to_string()),
            settings: None,
            plan: None,
            streaming: Arc::new(AtomicBool::new(false)),
            halt: Arc::new(AtomicBool::new(false)),
            worker: None,
        }
    }

    /// Устройство, выдающее данные в реальном темпе.
    pub fn paced() -> Self {
        let mut dev = Self::new();
        dev.pace = true;
        dev
    }

    pub fn with_serial(
        mut self,
        serial: Option<String>,
    ) -> Self {
        if serial.is_some() {
            self.serial = serial;
        }
        self
    }

    fn join_worker(&mut self) {
        self.halt.store(true, Ordering::SeqCst);

        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                warn!("Simulated driver thread panicked");
            }
        }

        self.streaming.store(false, Ordering::SeqCst);
    }
}

impl Default for SimulatedSweepDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SimulatedSweepDevice {
    fn drop(&mut self) {
        self.join_worker();
    }
}

impl BlockGenerator {
    fn new(plan: SimPlan) -> Self {
        Self {
            plan,
            freq_idx: 0,
            block_idx: 0,
            phase: 0.0,
        }
    }

    /// Заполняет transfer целыми блоками.
    fn fill(
        &mut self,
        transfer: &mut [u8],
    ) {
        for block in transfer.chunks_exact_mut(BYTES_PER_BLOCK) {
            let payload = if self.block_idx == 0 {
                encode_header(block, self.plan.frequencies[self.freq_idx]);
                &mut block[BLOCK_HEADER_SIZE..]
            } else {
                block
            };

            // Тон, зависящий от номера частоты; |I|,|Q| <= 100, маркер 0x7F
            // в данных не появляется.
            let step = 2.0 * PI * (self.freq_idx + 1) as f32 / 64.0;
            for pair in payload.chunks_exact_mut(2) {
                pair[0] = (100.0 * self.phase.cos()) as i8 as u8;
                pair[1] = (100.0 * self.phase.sin()) as i8 as u8;
                self.phase = (self.phase + step) % (2.0 * PI);
            }

            self.block_idx += 1;
            if self.block_idx == self.plan.blocks_per_frequency {
                self.block_idx = 0;
                self.freq_idx = (self.freq_idx + 1) % self.plan.frequencies.len();
            }
        }
    }
}

impl SweepDevice for SimulatedSweepDevice {
    fn info(&self) -> DeviceInfo {
        DeviceInfo {
            name: "Simulated sweep SDR".to_string(),
            serial: self.serial.clone(),
        }
    }

    fn configure(
        &mut self,
        settings: &DeviceSettings,
    ) -> RecorderResult<()> {
        if settings.sample_rate_hz == 0 {
            return Err(RecorderError::device(
                "set_sample_rate",
                "sample rate must be non-zero",
            ));
        }

        debug!("Simulated device configured: {settings:?}");
        self.settings = Some(settings.clone());
        Ok(())
    }

    fn plan_sweep(
        &mut self,
        table: &SweepTable,
        samples_per_frequency: u32,
        _tuning_step_hz: u64,
        tuning_offset_hz: u64,
    ) -> RecorderResult<()> {
        if table.is_empty() {
            return Err(RecorderError::device("init_sweep", "empty sweep table"));
        }

        if samples_per_frequency == 0 || samples_per_frequency % SAMPLES_PER_BLOCK != 0 {
            return Err(RecorderError::device(
                "init_sweep",
                format!("num_samples {samples_per_frequency} is not a multiple of {SAMPLES_PER_BLOCK}"),
            ));
        }

        debug!(
            "init_sweep({:?}, num_samples={samples_per_frequency})",
            table.device_pairs()
        );

        self.plan = Some(SimPlan {
            frequencies: table.tuning_frequencies(tuning_offset_hz).collect(),
            blocks_per_frequency: (samples_per_frequency / SAMPLES_PER_BLOCK) as usize,
        });
        Ok(())
    }

    fn start_streaming(
        &mut self,
        mut on_transfer: TransferCallback,
    ) -> RecorderResult<()> {
        if self.worker.is_some() {
            return Err(RecorderError::device("start_rx_sweep", "already streaming"));
        }

        let settings = self
            .settings
            .clone()
            .ok_or_else(|| RecorderError::device("start_rx_sweep", "device not configured"))?;
        let plan = self
            .plan
            .clone()
            .ok_or_else(|| RecorderError::device("start_rx_sweep", "sweep not initialized"))?;

        let pace = self.pace;
        let transfer_limit = self.transfer_limit;
        let streaming = self.streaming.clone();
        let halt = self.halt.clone();

        halt.store(false, Ordering::SeqCst);
        streaming.store(true, Ordering::SeqCst);

        let handle = thread::Builder::new()
            .name("sim-driver".to_string())
            .spawn(move || {
                let mut generator = BlockGenerator::new(plan);
                let mut buffer = vec![0u8; BYTES_PER_TRANSFER];
                // 2 байта на IQ пару
                let transfer_period = Duration::from_secs_f64(
                    BYTES_PER_TRANSFER as f64 / (2.0 * settings.sample_rate_hz as f64),
                );
                let start = Instant::now();
                let mut delivered: u64 = 0;

                while !halt.load(Ordering::SeqCst) {
                    if transfer_limit.is_some_and(|limit| delivered >= limit) {
                        thread::sleep(Duration::from_millis(5));
                        continue;
                    }

                    generator.fill(&mut buffer);
                    let action = on_transfer(Transfer {
                        buffer: &buffer,
                        valid_length: buffer.len(),
                    });
                    delivered += 1;

                    if action == CallbackAction::Stop {
                        break;
                    }

                    if pace {
                        let expected = transfer_period * delivered as u32;
                        let elapsed = start.elapsed();
                        if expected > elapsed {
                            thread::sleep(expected - elapsed);
                        }
                    }
                }

                debug!("Simulated driver thread exiting after {delivered} transfers");
                streaming.store(false, Ordering::SeqCst);
            })
            .map_err(|e| RecorderError::device("start_rx_sweep", e.to_string()))?;

        self.worker = Some(handle);
        Ok(())
    }

    fn is_streaming(&self) -> bool {
        self.streaming.load(Ordering::SeqCst)
    }

    fn stop(&mut self) -> RecorderResult<()> {
        self.join_worker();
        Ok(())
    }

    fn close(&mut self) -> RecorderResult<()> {
        self.join_worker();
        self.plan = None;
        self.settings = None;
        Ok(())
    }
}

/// Создаёт нужное устройство по конфигурации.
pub fn create_device(config: &SweepConfig) -> RecorderResult<Box<dyn SweepDevice>> {
    match &config.device {
        DeviceKind::Simulated => Ok(Box::new(
            SimulatedSweepDevice::paced().with_serial(config.serial.clone()),
        )),
        DeviceKind::HackRf => Err(RecorderError::DeviceNotFound(
            "HackRF sweep backend is not linked into this build. Use: --device sim".to_string(),
        )),
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
