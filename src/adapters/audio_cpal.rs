use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::mpsc::{self as std_mpsc, RecvTimeoutError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, Stream, StreamConfig};
use parking_lot::Mutex;
use ringbuf::traits::{Consumer, Producer, Split};
use ringbuf::HeapRb;
use tokio::sync::{broadcast, oneshot};
use tracing::{debug, error, info};

use crate::domain::{
    AtomicCaptureState, AudioDevice, AudioEvent, AudioFrame, CaptureConfig, CaptureState,
    SenseError,
};
use crate::ports::AudioCapture;

/// Lock-free ring between the cpal callback and the frame assembler.
type RingProducer = ringbuf::HeapProd<i16>;
type RingConsumer = ringbuf::HeapCons<i16>;

/// How often the assembler drains the ring while listening.
const DRAIN_INTERVAL: Duration = Duration::from_millis(25);

/// Commands sent to the capture thread.
enum CaptureCommand {
    Start {
        reply: oneshot::Sender<Result<(), SenseError>>,
    },
    Stop {
        reply: oneshot::Sender<Result<(), SenseError>>,
    },
    Shutdown,
}

/// Sample conversion utilities shared by the stream callbacks.
mod dsp {
    /// Average interleaved channels down to mono.
    pub fn downmix_to_mono(data: &[i16], channels: usize) -> Vec<i16> {
        if channels <= 1 {
            return data.to_vec();
        }
        data.chunks(channels)
            .map(|chunk| {
                let sum: i32 = chunk.iter().map(|&s| s as i32).sum();
                (sum / chunk.len() as i32) as i16
            })
            .collect()
    }

    /// Linear-interpolation resampler.
    pub fn resample_linear(samples: &[i16], from_rate: u32, to_rate: u32) -> Vec<i16> {
        if from_rate == to_rate || samples.is_empty() {
            return samples.to_vec();
        }

        let ratio = from_rate as f64 / to_rate as f64;
        let output_len = (samples.len() as f64 / ratio).ceil() as usize;
        let mut output = Vec::with_capacity(output_len);

        for i in 0..output_len {
            let src_pos = i as f64 * ratio;
            let src_idx = src_pos.floor() as usize;
            let frac = src_pos.fract();

            let sample = if src_idx + 1 < samples.len() {
                let s0 = samples[src_idx] as f64;
                let s1 = samples[src_idx + 1] as f64;
                (s0 + (s1 - s0) * frac) as i16
            } else if src_idx < samples.len() {
                samples[src_idx]
            } else {
                0
            };
            output.push(sample);
        }
        output
    }

    /// Convert f32 samples in [-1, 1] to 16-bit.
    pub fn f32_to_i16(data: &[f32]) -> Vec<i16> {
        data.iter()
            .map(|&s| (s.clamp(-1.0, 1.0) * 32767.0) as i16)
            .collect()
    }
}

fn default_input_device() -> Result<Device, SenseError> {
    cpal::default_host()
        .default_input_device()
        .ok_or_else(|| SenseError::AudioDevice {
            message: "No default input device available".to_string(),
        })
}

fn build_stream_config(device: &Device) -> Result<(StreamConfig, SampleFormat), SenseError> {
    let supported = device
        .default_input_config()
        .map_err(|e| SenseError::AudioDevice {
            message: format!("Failed to get default config: {}", e),
        })?;

    debug!(
        sample_rate = ?supported.sample_rate(),
        channels = supported.channels(),
        format = ?supported.sample_format(),
        "Device default config"
    );

    let config = StreamConfig {
        channels: supported.channels(),
        sample_rate: supported.sample_rate(),
        buffer_size: cpal::BufferSize::Default,
    };
    Ok((config, supported.sample_format()))
}

fn build_stream(
    device: &Device,
    config: &StreamConfig,
    sample_format: SampleFormat,
    target_sample_rate: u32,
    mut producer: RingProducer,
    state: Arc<AtomicCaptureState>,
    event_tx: broadcast::Sender<AudioEvent>,
) -> Result<Stream, SenseError> {
    let channels = config.channels as usize;
    let device_sample_rate = config.sample_rate.0;

    let state_err = Arc::clone(&state);
    let event_tx_err = event_tx.clone();
    let on_error = move |err| {
        error!(?err, "Audio stream error");
        if state_err.load() == CaptureState::Listening {
            state_err.store(CaptureState::DeviceLost);
            let _ = event_tx_err.send(AudioEvent::DeviceLost {
                device_name: "Unknown".to_string(),
            });
        }
    };

    let stream = match sample_format {
        SampleFormat::I16 => device.build_input_stream(
            config,
            move |data: &[i16], _: &cpal::InputCallbackInfo| {
                let mono = dsp::downmix_to_mono(data, channels);
                let resampled = dsp::resample_linear(&mono, device_sample_rate, target_sample_rate);
                let _ = producer.push_slice(&resampled);
            },
            on_error,
            None,
        ),
        SampleFormat::F32 => device.build_input_stream(
            config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                let as_i16 = dsp::f32_to_i16(data);
                let mono = dsp::downmix_to_mono(&as_i16, channels);
                let resampled = dsp::resample_linear(&mono, device_sample_rate, target_sample_rate);
                let _ = producer.push_slice(&resampled);
            },
            on_error,
            None,
        ),
        _ => {
            return Err(SenseError::AudioDevice {
                message: format!("Unsupported sample format: {:?}", sample_format),
            });
        }
    }
    .map_err(|e| SenseError::AudioDevice {
        message: format!("Failed to build stream: {}", e),
    })?;

    Ok(stream)
}

/// Capture thread: owns the non-Send cpal Stream and assembles fixed-length
/// analysis windows from the ring between commands.
fn capture_thread_main(
    config: CaptureConfig,
    state: Arc<AtomicCaptureState>,
    frame_tx: broadcast::Sender<AudioFrame>,
    event_tx: broadcast::Sender<AudioEvent>,
    current_level: Arc<AtomicU32>,
    cmd_rx: std_mpsc::Receiver<CaptureCommand>,
) {
    let mut stream: Option<Stream> = None;
    let mut consumer: Option<RingConsumer> = None;
    let window_len = config.window_len();
    let mut window: Vec<i16> = Vec::with_capacity(window_len);

    loop {
        match cmd_rx.recv_timeout(DRAIN_INTERVAL) {
            Ok(CaptureCommand::Start { reply }) => {
                let result = (|| -> Result<(), SenseError> {
                    if !state.load().can_start() {
                        return Err(SenseError::AlreadyListening);
                    }

                    let device = default_input_device()?;
                    let device_name = device.name().unwrap_or_else(|_| "Unknown".to_string());
                    let (stream_config, sample_format) = build_stream_config(&device)?;

                    let ring = HeapRb::<i16>::new(config.ring_capacity());
                    let (producer, cons) = ring.split();

                    let new_stream = build_stream(
                        &device,
                        &stream_config,
                        sample_format,
                        config.sample_rate,
                        producer,
                        Arc::clone(&state),
                        event_tx.clone(),
                    )?;

                    new_stream.play().map_err(|e| SenseError::AudioDevice {
                        message: format!("Failed to start stream: {}", e),
                    })?;

                    stream = Some(new_stream);
                    consumer = Some(cons);
                    window.clear();

                    let from = state.load();
                    state.store(CaptureState::Listening);
                    let _ = event_tx.send(AudioEvent::StateChanged {
                        from,
                        to: CaptureState::Listening,
                    });

                    info!(device = %device_name, "Ambient capture started");
                    Ok(())
                })();
                let _ = reply.send(result);
            }
            Ok(CaptureCommand::Stop { reply }) => {
                let result = (|| -> Result<(), SenseError> {
                    if !state.load().can_stop() {
                        return Err(SenseError::NotListening);
                    }

                    stream.take();
                    consumer.take();
                    window.clear();
                    current_level.store(0f32.to_bits(), Ordering::Relaxed);

                    let from = state.load();
                    state.store(CaptureState::Idle);
                    let _ = event_tx.send(AudioEvent::StateChanged {
                        from,
                        to: CaptureState::Idle,
                    });

                    info!("Ambient capture stopped");
                    Ok(())
                })();
                let _ = reply.send(result);
            }
            Ok(CaptureCommand::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {
                if let Some(cons) = consumer.as_mut() {
                    drain_windows(
                        cons,
                        &mut window,
                        window_len,
                        config.sample_rate,
                        &frame_tx,
                        &current_level,
                    );
                }
            }
        }
    }
    debug!("Capture thread shutting down");
}

fn drain_windows(
    consumer: &mut RingConsumer,
    window: &mut Vec<i16>,
    window_len: usize,
    sample_rate: u32,
    frame_tx: &broadcast::Sender<AudioFrame>,
    current_level: &AtomicU32,
) {
    let mut chunk = [0i16; 2048];
    loop {
        let read = consumer.pop_slice(&mut chunk);
        if read == 0 {
            break;
        }
        for &sample in &chunk[..read] {
            window.push(sample);
            if window.len() == window_len {
                let samples = std::mem::replace(window, Vec::with_capacity(window_len));
                let frame = AudioFrame::new(samples, sample_rate);
                current_level.store(frame.rms.to_bits(), Ordering::Relaxed);
                let _ = frame_tx.send(frame);
            }
        }
    }
}

/// cpal-based continuous capture.
///
/// A dedicated thread owns the non-Send Stream; the callback only pushes into
/// a lock-free ring, and the same thread slices the ring into analysis
/// windows between command polls.
pub struct CpalAudioCapture {
    config: CaptureConfig,
    state: Arc<AtomicCaptureState>,
    frame_tx: broadcast::Sender<AudioFrame>,
    event_tx: broadcast::Sender<AudioEvent>,
    current_level: Arc<AtomicU32>,
    cmd_tx: std_mpsc::Sender<CaptureCommand>,
    thread_handle: Mutex<Option<JoinHandle<()>>>,
}

impl CpalAudioCapture {
    pub fn new(config: CaptureConfig) -> Result<Self, SenseError> {
        let state = Arc::new(AtomicCaptureState::default());
        let (frame_tx, _) = broadcast::channel(32);
        let (event_tx, _) = broadcast::channel(32);
        let current_level = Arc::new(AtomicU32::new(0));
        let (cmd_tx, cmd_rx) = std_mpsc::channel();

        let thread_config = config.clone();
        let thread_state = Arc::clone(&state);
        let thread_frame_tx = frame_tx.clone();
        let thread_event_tx = event_tx.clone();
        let thread_level = Arc::clone(&current_level);

        let thread_handle = thread::Builder::new()
            .name("ambient-capture".to_string())
            .spawn(move || {
                capture_thread_main(
                    thread_config,
                    thread_state,
                    thread_frame_tx,
                    thread_event_tx,
                    thread_level,
                    cmd_rx,
                )
            })
            .map_err(|e| SenseError::AudioDevice {
                message: format!("Failed to spawn capture thread: {}", e),
            })?;

        info!(
            sample_rate = config.sample_rate,
            window_ms = config.window_ms,
            "CpalAudioCapture initialized"
        );

        Ok(Self {
            config,
            state,
            frame_tx,
            event_tx,
            current_level,
            cmd_tx,
            thread_handle: Mutex::new(Some(thread_handle)),
        })
    }

    /// The capture settings this pipeline was built with.
    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    async fn send_command<F>(&self, make: F) -> Result<(), SenseError>
    where
        F: FnOnce(oneshot::Sender<Result<(), SenseError>>) -> CaptureCommand,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.cmd_tx
            .send(make(reply_tx))
            .map_err(|_| SenseError::AudioDevice {
                message: "Capture thread not running".to_string(),
            })?;
        reply_rx.await.map_err(|_| SenseError::AudioDevice {
            message: "Capture thread did not respond".to_string(),
        })?
    }
}

impl Drop for CpalAudioCapture {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(CaptureCommand::Shutdown);
        if let Some(handle) = self.thread_handle.lock().take() {
            let _ = handle.join();
        }
    }
}

#[async_trait]
impl AudioCapture for CpalAudioCapture {
    async fn start(&self) -> Result<(), SenseError> {
        self.send_command(|reply| CaptureCommand::Start { reply })
            .await
    }

    async fn stop(&self) -> Result<(), SenseError> {
        self.send_command(|reply| CaptureCommand::Stop { reply })
            .await
    }

    fn state(&self) -> CaptureState {
        self.state.load()
    }

    fn subscribe(&self) -> broadcast::Receiver<AudioFrame> {
        self.frame_tx.subscribe()
    }

    fn subscribe_events(&self) -> broadcast::Receiver<AudioEvent> {
        self.event_tx.subscribe()
    }

    fn list_input_devices(&self) -> Result<Vec<AudioDevice>, SenseError> {
        let host = cpal::default_host();
        let default_name = host.default_input_device().and_then(|d| d.name().ok());

        let devices = host.input_devices().map_err(|e| SenseError::AudioDevice {
            message: format!("Failed to enumerate devices: {}", e),
        })?;

        let mut result = Vec::new();
        let mut name_counts: std::collections::HashMap<String, usize> =
            std::collections::HashMap::new();

        for device in devices {
            if let Ok(name) = device.name() {
                let count = name_counts.entry(name.clone()).or_insert(0);
                let id = if *count == 0 {
                    name.clone()
                } else {
                    format!("{}:{}", name, count)
                };
                *count += 1;

                result.push(AudioDevice {
                    id,
                    name: name.clone(),
                    is_default: Some(&name) == default_name.as_ref(),
                });
            }
        }

        debug!(count = result.len(), "Listed input devices");
        Ok(result)
    }

    fn current_level(&self) -> f32 {
        f32::from_bits(self.current_level.load(Ordering::Relaxed))
    }
}
