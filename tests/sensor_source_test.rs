//! Integration tests for the live sensor source

use async_trait::async_trait;
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use synheart_ecg_bridge::core::EcgPipeline;
use synheart_ecg_bridge::output::{MetricReading, MetricSink};
use synheart_ecg_bridge::source::{
    synthesize_ecg, DeviceInfo, DriverError, EcgDevice, EcgDriver, EcgFrame, FrameCallback,
    RealSensorSource, ReplayDriver, SensorMetadata, SensorState, SyntheticEcgDriver,
    SyntheticParams,
};
use synheart_ecg_bridge::{create_shared_stats, Config, Shutdown, SourceError};

#[derive(Default)]
struct Recorder {
    readings: Vec<MetricReading>,
}

impl MetricSink for Recorder {
    fn publish(&mut self, reading: &MetricReading) {
        self.readings.push(*reading);
    }
}

type CallLog = Arc<Mutex<Vec<String>>>;

/// Driver whose device replays fixed frames on subscribe.
struct MockDriver {
    devices: Vec<DeviceInfo>,
    frames: Vec<Vec<f64>>,
    fail_subscribe: bool,
    calls: CallLog,
}

struct MockDevice {
    device: DeviceInfo,
    callback: FrameCallback,
    frames: Vec<Vec<f64>>,
    fail_subscribe: bool,
    calls: CallLog,
}

impl MockDriver {
    fn new(devices: Vec<DeviceInfo>, frames: Vec<Vec<f64>>) -> (Self, CallLog) {
        let calls = CallLog::default();
        let driver = Self {
            devices,
            frames,
            fail_subscribe: false,
            calls: calls.clone(),
        };
        (driver, calls)
    }
}

#[async_trait]
impl EcgDriver for MockDriver {
    async fn detect_devices(&mut self) -> Result<Vec<DeviceInfo>, DriverError> {
        self.calls.lock().unwrap().push("detect".to_string());
        Ok(self.devices.clone())
    }

    async fn connect(
        &mut self,
        device: DeviceInfo,
        callback: FrameCallback,
    ) -> Result<Box<dyn EcgDevice>, DriverError> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("connect:{}", device.identifier));
        Ok(Box::new(MockDevice {
            device,
            callback,
            frames: self.frames.clone(),
            fail_subscribe: self.fail_subscribe,
            calls: self.calls.clone(),
        }))
    }
}

#[async_trait]
impl EcgDevice for MockDevice {
    async fn start(&mut self) -> Result<(), DriverError> {
        self.calls.lock().unwrap().push("start".to_string());
        Ok(())
    }

    async fn subscribe(&mut self, channel: &str) -> Result<(), DriverError> {
        self.calls.lock().unwrap().push(format!("subscribe:{channel}"));
        if self.fail_subscribe {
            return Err(DriverError::Subscription {
                channel: channel.to_string(),
                reason: "rejected".to_string(),
            });
        }
        for samples in &self.frames {
            let frame = EcgFrame {
                timestamps: (0..samples.len() as u64).map(|i| i * 4).collect(),
                samples: samples.clone(),
                metadata: SensorMetadata {
                    channel: channel.to_string(),
                    sampling_rate_hz: 250,
                },
            };
            (self.callback)(&self.device, frame);
        }
        Ok(())
    }

    async fn unsubscribe_all(&mut self) -> Result<(), DriverError> {
        self.calls.lock().unwrap().push("unsubscribe_all".to_string());
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), DriverError> {
        self.calls.lock().unwrap().push("stop".to_string());
        Ok(())
    }
}

fn stop_after(shutdown: &Shutdown, after: Duration) {
    let shutdown = shutdown.clone();
    tokio::spawn(async move {
        tokio::time::sleep(after).await;
        shutdown.request();
    });
}

fn source_with(driver: impl EcgDriver + 'static) -> RealSensorSource {
    let config = Config::default();
    let stats = create_shared_stats();
    RealSensorSource::with_pipeline(
        Box::new(driver),
        EcgPipeline::new(&config, stats.clone()),
        config.ecg_channel(),
        stats,
    )
    .with_idle_tick(Duration::from_millis(10))
}

#[tokio::test(start_paused = true)]
async fn test_frames_flow_into_pipeline_and_teardown_is_ordered() {
    let ecg = synthesize_ecg(SyntheticParams::default(), 250, 10.0, 21);
    let (driver, calls) = MockDriver::new(
        vec![
            DeviceInfo::new("Sensor A", "AA:BB"),
            DeviceInfo::new("Sensor B", "CC:DD"),
        ],
        vec![Vec::new(), ecg],
    );
    let mut source = source_with(driver);
    let mut sink = Recorder::default();
    let shutdown = Shutdown::new();
    stop_after(&shutdown, Duration::from_millis(100));

    source.run(&mut sink, &shutdown).await.unwrap();

    assert_eq!(
        *calls.lock().unwrap(),
        vec![
            "detect",
            "connect:Sensor A",
            "start",
            "subscribe:/Meas/ECG/250",
            "unsubscribe_all",
            "stop",
        ]
    );
    assert_eq!(source.state(), SensorState::Disconnected);
    // Empty frame dropped, full window analyzed once
    assert_eq!(source.pipeline().buffer().len(), 2500);
    assert_eq!(sink.readings.len(), 1);
    assert!((0.0..=200.0).contains(&sink.readings[0].value));
}

#[tokio::test]
async fn test_no_device_ends_run() {
    let (driver, calls) = MockDriver::new(Vec::new(), Vec::new());
    let mut source = source_with(driver);
    let mut sink = Recorder::default();

    let result = source.run(&mut sink, &Shutdown::new()).await;

    assert!(matches!(result, Err(SourceError::NoDevice)));
    assert_eq!(*calls.lock().unwrap(), vec!["detect"]);
    assert_eq!(source.state(), SensorState::Disconnected);
    assert!(sink.readings.is_empty());
}

#[tokio::test]
async fn test_teardown_runs_when_subscribe_fails() {
    let devices = vec![DeviceInfo::new("Sensor A", "AA:BB")];
    let (mut driver, calls) = MockDriver::new(devices, Vec::new());
    driver.fail_subscribe = true;
    let mut source = source_with(driver);
    let mut sink = Recorder::default();

    let result = source.run(&mut sink, &Shutdown::new()).await;

    assert!(matches!(
        result,
        Err(SourceError::Driver(DriverError::Subscription { .. }))
    ));
    let calls = calls.lock().unwrap();
    assert_eq!(&calls[calls.len() - 2..], ["unsubscribe_all", "stop"]);
}

#[tokio::test(start_paused = true)]
async fn test_synthetic_driver_end_to_end() {
    let config = Config::default();
    let stats = create_shared_stats();
    let driver = SyntheticEcgDriver::new(SyntheticParams::default());
    let mut source = RealSensorSource::new(Box::new(driver), &config, stats.clone());
    let mut sink = Recorder::default();
    let shutdown = Shutdown::new();
    stop_after(&shutdown, Duration::from_secs(12));

    source.run(&mut sink, &shutdown).await.unwrap();

    let snap = stats.snapshot();
    assert!(snap.frames_received > 0);
    assert!(snap.samples_ingested >= 2500);
    assert!(!sink.readings.is_empty());
    assert!(sink
        .readings
        .iter()
        .all(|r| r.value.is_finite() && (0.0..=200.0).contains(&r.value)));
}

#[tokio::test(start_paused = true)]
async fn test_replay_driver_end_to_end() {
    let ecg = synthesize_ecg(SyntheticParams::default(), 250, 12.0, 77);
    let mut file = tempfile::NamedTempFile::new().unwrap();
    for line in ecg.chunks(8) {
        let text: Vec<String> = line.iter().map(|v| v.to_string()).collect();
        writeln!(file, "{}", text.join(", ")).unwrap();
    }

    let config = Config::default();
    let stats = create_shared_stats();
    let driver = ReplayDriver::open(file.path(), config.sampling_rate_hz).unwrap();
    assert_eq!(driver.sample_count(), 3000);

    let mut source = RealSensorSource::new(Box::new(driver), &config, stats.clone());
    let mut sink = Recorder::default();
    let shutdown = Shutdown::new();
    stop_after(&shutdown, Duration::from_secs(11));

    source.run(&mut sink, &shutdown).await.unwrap();

    assert!(!sink.readings.is_empty());
    assert!((0.0..=200.0).contains(&sink.readings[0].value));
}
