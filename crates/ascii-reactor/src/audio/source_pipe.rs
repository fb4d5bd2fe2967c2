//! Audio device capture and stream management.
//!
//! Handles audio input from system devices using cpal, managing device enumeration,
//! stream creation, and a ring buffer the frame provider reads from.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use ascii_reactor_core::{AudioFrame, FrameSource, SPECTRUM_SIZE, WAVEFORM_SIZE};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig};
use tracing::{error, info, warn};

use super::spectrum::{SpectrumAnalyzer, FFT_SIZE};
use crate::utils::Config;

const FALLBACK_SAMPLE_RATE: f32 = 44_100.0;

pub struct DeviceInfo {
    pub device: cpal::Device,
    pub name: String,
    pub is_input: bool,
}

pub struct SourcePipe {
    buffer: Arc<Mutex<VecDeque<f32>>>,
    devices: Vec<DeviceInfo>,
    current_device: usize,
    stream: Option<Stream>,
    sample_rate: f32,
    device_timeout: Duration,
    analyzer: SpectrumAnalyzer,
    snapshot: Vec<f32>,
    waveform: Vec<f32>,
    spectrum: Vec<f32>,
    // Auto-gain normalization state
    smoothed_peak: f32,
    target_level: f32,
}

impl SourcePipe {
    pub fn new(config: &Config) -> Self {
        let devices = Self::collect_devices();
        let buffer = Arc::new(Mutex::new(VecDeque::from(vec![0.0; FFT_SIZE])));
        let device_timeout = Duration::from_secs(config.device_timeout_secs());

        let start_index = config
            .last_device
            .as_ref()
            .and_then(|name| {
                let is_input = config.last_device_is_input.unwrap_or(true);
                devices
                    .iter()
                    .position(|d| d.name == *name && d.is_input == is_input)
            })
            .or_else(|| {
                // Prefer pipewire or pulse input devices (more reliable on Linux)
                devices
                    .iter()
                    .position(|d| d.is_input && d.name == "pipewire")
            })
            .or_else(|| devices.iter().position(|d| d.is_input && d.name == "pulse"))
            .or_else(|| {
                let host = cpal::default_host();
                let default_input_name = host.default_input_device().and_then(|d| d.name().ok());
                default_input_name
                    .and_then(|name| devices.iter().position(|d| d.is_input && d.name == name))
            })
            .unwrap_or(0);

        let opened = match devices.get(start_index) {
            Some(info) => Self::build_stream(info, Arc::clone(&buffer), device_timeout),
            None => {
                error!("no audio devices found");
                None
            }
        };

        let (stream, sample_rate) = match opened {
            Some((stream, rate)) => {
                let info = &devices[start_index];
                info!(
                    index = start_index,
                    device = %info.name,
                    kind = if info.is_input { "input" } else { "output" },
                    sample_rate = rate,
                    "audio source selected"
                );
                (Some(stream), rate)
            }
            None => (None, FALLBACK_SAMPLE_RATE),
        };

        Self {
            buffer,
            devices,
            current_device: start_index,
            stream,
            sample_rate,
            device_timeout,
            analyzer: SpectrumAnalyzer::new(),
            snapshot: Vec::with_capacity(FFT_SIZE),
            waveform: vec![0.0; WAVEFORM_SIZE],
            spectrum: vec![0.0; SPECTRUM_SIZE],
            smoothed_peak: 0.1, // Start with a reasonable default
            target_level: 0.5,  // Target peak level for normalization
        }
    }

    pub fn list_devices() {
        let host = cpal::default_host();
        info!("=== Audio Devices ===");

        let mut idx = 0;
        if let Ok(inputs) = host.input_devices() {
            for device in inputs {
                if let Ok(name) = device.name() {
                    info!("  [{}] {} (input)", idx, name);
                    idx += 1;
                }
            }
        }
        if let Ok(outputs) = host.output_devices() {
            for device in outputs {
                if let Ok(name) = device.name() {
                    info!("  [{}] {} (output)", idx, name);
                    idx += 1;
                }
            }
        }
        info!("Use 0-9 to switch devices");
    }

    fn collect_devices() -> Vec<DeviceInfo> {
        let host = cpal::default_host();
        let mut devices = Vec::new();

        if let Ok(input_devices) = host.input_devices() {
            for device in input_devices {
                if let Ok(name) = device.name() {
                    devices.push(DeviceInfo {
                        device,
                        name,
                        is_input: true,
                    });
                }
            }
        }

        if let Ok(output_devices) = host.output_devices() {
            for device in output_devices {
                if let Ok(name) = device.name() {
                    devices.push(DeviceInfo {
                        device,
                        name,
                        is_input: false,
                    });
                }
            }
        }

        devices
    }

    /// Get device config with timeout (the config call often hangs on bad devices)
    fn get_config_with_timeout(device: &Device, is_input: bool, timeout: Duration) -> Option<StreamConfig> {
        let device_clone = device.clone();

        let (tx, rx) = std::sync::mpsc::channel();

        std::thread::spawn(move || {
            let config = if is_input {
                device_clone.default_input_config()
            } else {
                device_clone.default_output_config()
            };
            let _ = tx.send(config);
        });

        match rx.recv_timeout(timeout) {
            Ok(Ok(config)) => Some(config.into()),
            Ok(Err(e)) => {
                warn!("failed to get device config: {}", e);
                None
            }
            Err(_) => {
                warn!("device config timed out after {:?}", timeout);
                None
            }
        }
    }

    fn build_stream(
        device_info: &DeviceInfo,
        audio_buffer: Arc<Mutex<VecDeque<f32>>>,
        timeout: Duration,
    ) -> Option<(Stream, f32)> {
        let stream_config = Self::get_config_with_timeout(&device_info.device, device_info.is_input, timeout)?;
        let channels = (stream_config.channels as usize).max(1);
        let sample_rate = stream_config.sample_rate.0 as f32;

        let err_fn = |err| error!("audio stream error: {}", err);

        let stream = device_info.device.build_input_stream(
            &stream_config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                // A poisoned lock only means a reader panicked; drop the chunk
                let Ok(mut buffer) = audio_buffer.lock() else {
                    return;
                };
                for chunk in data.chunks(channels) {
                    let sample: f32 = chunk.iter().sum::<f32>() / channels as f32;
                    buffer.pop_front();
                    buffer.push_back(sample);
                }
            },
            err_fn,
            None,
        );

        match stream {
            Ok(s) => {
                if let Err(e) = s.play() {
                    warn!("failed to play stream: {}", e);
                    return None;
                }
                Some((s, sample_rate))
            }
            Err(e) => {
                warn!("failed to build stream: {}", e);
                None
            }
        }
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn is_active(&self) -> bool {
        self.stream.is_some()
    }

    /// Attempts to select a device.
    /// Returns Some((device_name, success)) if a switch was attempted, None if index invalid.
    pub fn select_device(&mut self, index: usize, config: &mut Config) -> Option<(String, bool)> {
        let info = self.devices.get(index)?;
        let device_name = info.name.clone();
        if index == self.current_device && self.stream.is_some() {
            return Some((device_name, true));
        }

        let is_input = info.is_input;
        info!(index, device = %device_name, is_input, "selecting audio source");

        if let Ok(mut buf) = self.buffer.lock() {
            buf.iter_mut().for_each(|x| *x = 0.0);
        }

        match Self::build_stream(info, Arc::clone(&self.buffer), self.device_timeout) {
            Some((stream, rate)) => {
                self.stream = Some(stream);
                self.sample_rate = rate;
                self.current_device = index;
                config.set_device(&device_name, is_input);
                Some((device_name, true))
            }
            None => {
                warn!(device = %device_name, "audio source failed to open");
                Some((device_name, false))
            }
        }
    }

    /// Copy the ring buffer and apply auto-gain normalization
    fn refresh(&mut self) {
        self.snapshot.clear();
        if let Ok(buffer) = self.buffer.lock() {
            self.snapshot.extend(buffer.iter().copied());
        }

        // Calculate current peak level (absolute max)
        let current_peak = self.snapshot.iter().map(|s| s.abs()).fold(0.0f32, f32::max);

        // Smooth the peak tracking (fast attack, slow release for stability)
        if current_peak > self.smoothed_peak {
            self.smoothed_peak = self.smoothed_peak * 0.8 + current_peak * 0.2;
        } else {
            self.smoothed_peak = self.smoothed_peak * 0.995 + current_peak * 0.005;
        }

        // Prevent division by zero and limit gain range
        let safe_peak = self.smoothed_peak.max(0.001);
        let gain = (self.target_level / safe_peak).clamp(0.5, 10.0);
        self.snapshot
            .iter_mut()
            .for_each(|s| *s = (*s * gain).clamp(-1.0, 1.0));

        let tail = self.snapshot.len().saturating_sub(WAVEFORM_SIZE);
        self.waveform.clear();
        self.waveform.extend_from_slice(&self.snapshot[tail..]);
        self.waveform.resize(WAVEFORM_SIZE, 0.0);

        self.analyzer.process(&self.snapshot, &mut self.spectrum);
    }
}

impl FrameSource for SourcePipe {
    fn frame(&mut self) -> Option<AudioFrame<'_>> {
        if self.stream.is_none() {
            return None;
        }
        self.refresh();
        Some(AudioFrame::new(&self.waveform, &self.spectrum))
    }
}
