use std::{
    fs::File,
    io::{self, Write},
    sync::{atomic::Ordering, Arc},
    thread::{self, JoinHandle},
    time::Instant,
};

use crossbeam_channel::{Receiver, Sender, TrySendError};
use log::{debug, error, info, warn};
use sweepraw_core::{
    OutputChunk, OutputSink, RateMonitor, StopReason, StopSignal, SweepState, Timestamper,
    TransferProcessor,
};
use sweepraw_types::{SweepTable, Timestamp, DEFAULT_SAMPLE_RATE_HZ, TUNING_OFFSET_HZ};

use crate::{
    device::{SweepDevice, Transfer, TransferCallback},
    metrics::SweepMetrics,
    OutputTarget, RecorderError, RecorderResult, SweepConfig,
};

/// Оркестрирует сессию sweep.
///
/// Три потока: поток драйвера вызывает callback, который разбирает блоки и
/// кладёт сегменты в ограниченную очередь; поток записи сериализует их в
/// выходной поток; текущий поток опрашивает устройство и монитор скорости.
pub struct SweepPipeline {
    config: SweepConfig,
    table: Arc<SweepTable>,
    state: Arc<SweepState>,
    stop: Arc<StopSignal>,
    metrics: Arc<SweepMetrics>,
}

impl SweepPipeline {
    /// Проверяет конфигурацию и планирует таблицу. Возвращает также
    /// shared-ссылку на метрики.
    pub fn new(config: SweepConfig) -> RecorderResult<(Self, Arc<SweepMetrics>)> {
        for warning in config.validate()? {
            warn!("{warning}");
        }

        let table = Arc::new(config.plan()?);
        let metrics = SweepMetrics::new();

        let p = Self {
            config,
            table,
            state: SweepState::new(),
            stop: StopSignal::new(),
            metrics: metrics.clone(),
        };

        Ok((p, metrics))
    }

    /// Сигнал остановки. Используется обработчиком Ctrl+C.
    pub fn stop_signal(&self) -> Arc<StopSignal> {
        self.stop.clone()
    }

    pub fn state(&self) -> Arc<SweepState> {
        self.state.clone()
    }

    pub fn table(&self) -> &SweepTable {
        &self.table
    }

    /// Запускает захват в выходной поток из конфигурации. Блокируется до
    /// завершения.
    pub fn run(
        self,
        mut device: Box<dyn SweepDevice>,
    ) -> RecorderResult<()> {
        let output: Box<dyn Write + Send> = match &self.config.output {
            OutputTarget::Stdout => Box::new(io::stdout()),
            OutputTarget::File(path) => match File::create(path) {
                Ok(file) => Box::new(file),
                Err(e) => {
                    error!("Failed to open {}: {e}", path.display());
                    close_device(device.as_mut());
                    return Err(e.into());
                }
            },
        };

        self.run_with_output(device, output)
    }

    /// Запускает захват в произвольный writer.
    pub fn run_with_output<W>(
        self,
        mut device: Box<dyn SweepDevice>,
        output: W,
    ) -> RecorderResult<()>
    where
        W: Write + Send + 'static,
    {
        let info = device.info();
        info!(
            "Starting sweep: {} (serial {}), {} ranges, {} steps per sweep, stop: {}",
            info.name,
            info.serial.as_deref().unwrap_or("-"),
            self.table.len(),
            self.table.total_steps(),
            self.config.stop_policy
        );

        if let Err(e) = self.prepare_device(device.as_mut()) {
            close_device(device.as_mut());
            return Err(e);
        }

        let (tx, rx) = crossbeam_channel::bounded::<OutputChunk>(self.config.queue_capacity);
        let writer_handle = match self.spawn_writer(rx, output) {
            Ok(handle) => handle,
            Err(e) => {
                close_device(device.as_mut());
                return Err(e);
            }
        };

        let streaming = device.start_streaming(self.transfer_callback(tx));

        let control_result = match streaming {
            Ok(()) => self.control_loop(device.as_ref()),
            Err(e) => Err(e),
        };

        // Остановка устройства освобождает callback, а вместе с ним и Sender:
        // поток записи дочитывает очередь и завершается.
        if let Err(e) = device.stop() {
            warn!("{e}");
        } else {
            info!("stop_rx() done");
        }
        close_device(device.as_mut());
        drop(device);

        let writer_result = writer_handle
            .join()
            .unwrap_or_else(|_| {
                Err(RecorderError::Pipeline(
                    "writer thread panicked".to_string(),
                ))
            });

        match (control_result, writer_result) {
            (Err(e), writer) => {
                if let Err(we) = writer {
                    warn!("Writer finished with error: {we}");
                }
                Err(e)
            }
            (Ok(()), Err(we)) => Err(we),
            (Ok(()), Ok(())) if self.stop.reason() == Some(StopReason::OutputFailed) => Err(
                RecorderError::Pipeline("output channel closed unexpectedly".to_string()),
            ),
            (Ok(()), Ok(())) => Ok(()),
        }
    }

    fn prepare_device(
        &self,
        device: &mut dyn SweepDevice,
    ) -> RecorderResult<()> {
        let settings = self.config.device_settings();

        info!(
            "call set_sample_rate({:.03} MHz), set_baseband_filter_bandwidth({:.03} MHz)",
            settings.sample_rate_hz as f64 / 1e6,
            settings.baseband_filter_hz as f64 / 1e6
        );
        device.configure(&settings)?;

        device.plan_sweep(
            &self.table,
            self.config.samples_per_frequency,
            self.table.step_hz(),
            TUNING_OFFSET_HZ,
        )
    }

    /// Callback для драйвера. Не выполняет I/O: только разбор и передачу
    /// сегментов в очередь.
    fn transfer_callback(
        &self,
        tx: Sender<OutputChunk>,
    ) -> TransferCallback {
        let timestamper =
            Timestamper::for_sweep(self.config.samples_per_frequency, DEFAULT_SAMPLE_RATE_HZ);
        let mut processor = TransferProcessor::for_sweep(
            &self.table,
            TUNING_OFFSET_HZ,
            self.config.stop_policy,
            timestamper,
            self.state.clone(),
            self.stop.clone(),
        );
        let metrics = self.metrics.clone();

        Box::new(move |transfer: Transfer<'_>| {
            let arrival = Timestamp::now();
            let bytes = transfer.valid_length.min(transfer.buffer.len()) as u64;

            let outcome = processor.process(
                transfer.buffer,
                transfer.valid_length,
                arrival,
                |segment| match tx.try_send(OutputChunk::from(segment)) {
                    Ok(()) => true,
                    Err(TrySendError::Full(chunk)) => {
                        // Очередь полна: ждём писателя, но ничего не теряем
                        metrics.backpressure_events.fetch_add(1, Ordering::Relaxed);
                        tx.send(chunk).is_ok()
                    }
                    Err(TrySendError::Disconnected(_)) => false,
                },
            );

            metrics.record_transfer(bytes, &outcome);
            outcome.action
        })
    }

    fn spawn_writer<W>(
        &self,
        rx: Receiver<OutputChunk>,
        output: W,
    ) -> RecorderResult<JoinHandle<RecorderResult<()>>>
    where
        W: Write + Send + 'static,
    {
        let metrics = self.metrics.clone();
        let stop = self.stop.clone();

        thread::Builder::new()
            .name("sweep-writer".to_string())
            .spawn(move || writer_loop(rx, output, &metrics, &stop))
            .map_err(|e| RecorderError::Pipeline(format!("failed to spawn writer: {e}")))
    }

    /// Опрос устройства и монитора скорости до сигнала остановки.
    fn control_loop(
        &self,
        device: &dyn SweepDevice,
    ) -> RecorderResult<()> {
        let mut monitor = RateMonitor::new(self.config.monitor_interval, Instant::now());

        info!("Stop with Ctrl-C");

        while device.is_streaming() && !self.stop.is_set() {
            thread::sleep(self.config.poll_interval);

            match monitor.poll(Instant::now(), &self.state) {
                Ok(Some(report)) => {
                    info!(
                        "{} total sweeps completed, {:.2} sweeps/second",
                        report.total_sweeps, report.sweep_rate
                    );
                    debug!(
                        "{:.1} MB/s, {:.2} sweeps/second average",
                        report.throughput_mbps(),
                        report.average_rate
                    );
                }
                Ok(None) => {}
                Err(stall) => {
                    error!("{stall}");
                    self.stop.request(StopReason::DataStall);
                    return Err(stall.into());
                }
            }
        }

        match self.stop.reason() {
            Some(reason) => {
                info!("Exiting... ({reason})");
                Ok(())
            }
            None => {
                self.stop.request(StopReason::DeviceStopped);
                Err(RecorderError::device(
                    "is_streaming",
                    "device stopped streaming without a stop request",
                ))
            }
        }
    }
}

/// Поток записи: сериализует сегменты строго в порядке поступления.
fn writer_loop<W: Write>(
    rx: Receiver<OutputChunk>,
    output: W,
    metrics: &SweepMetrics,
    stop: &StopSignal,
) -> RecorderResult<()> {
    let mut sink = OutputSink::new(output);

    // Очередь закрывается, когда устройство отпускает callback
    for chunk in rx.iter() {
        if let Err(e) = sink.write_segment(&chunk.as_segment()) {
            error!("Output write failed: {e}");
            stop.request(StopReason::OutputFailed);
            return Err(e.into());
        }

        metrics
            .samples_written
            .store(sink.samples_written(), Ordering::Relaxed);
        metrics
            .freq_lines_written
            .store(sink.tags_written(), Ordering::Relaxed);
    }

    if let Err(e) = sink.flush() {
        error!("Output flush failed: {e}");
        stop.request(StopReason::OutputFailed);
        return Err(e.into());
    }

    debug!("Output flushed: {} samples", sink.samples_written());
    Ok(())
}

fn close_device(device: &mut dyn SweepDevice) {
    match device.close() {
        Ok(()) => info!("close() done"),
        Err(e) => warn!("{e}"),
    }
}
