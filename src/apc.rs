//! Akai APC Key 25 mk2 driver
//!
//! Handles MIDI communication with the pad controller. Incoming bytes are
//! forwarded untouched to the router; outgoing LED batches are written as a
//! single buffer.

pub mod layout;

use anyhow::{Context, Result};
use midir::{MidiInput, MidiInputConnection, MidiOutput, MidiOutputConnection};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

use crate::config::MidiConfig;
use crate::midi::format_hex;
use crate::render::{encode_batch, LedCell};

/// Raw MIDI bytes from the surface
#[derive(Debug, Clone)]
pub struct SurfaceEvent {
    pub timestamp: Instant,
    pub raw_data: Vec<u8>,
}

/// APC driver for hardware communication
pub struct ApcDriver {
    input_conn: Option<MidiInputConnection<()>>,
    output_conn: Option<Arc<Mutex<MidiOutputConnection>>>,

    /// Kept across reconnects so the router keeps a single receiver
    event_tx: mpsc::Sender<SurfaceEvent>,
    event_rx: Option<mpsc::Receiver<SurfaceEvent>>,

    input_port_name: String,
    output_port_name: String,
}

impl ApcDriver {
    pub fn new(config: &MidiConfig) -> Self {
        let (event_tx, event_rx) = mpsc::channel(1000);

        Self {
            input_conn: None,
            output_conn: None,
            event_tx,
            event_rx: Some(event_rx),
            input_port_name: config.input_port.clone(),
            output_port_name: config.output_port.clone(),
        }
    }

    /// Find an input port by case-insensitive substring match
    fn find_input_port(
        midi_in: &MidiInput,
        pattern: &str,
    ) -> Option<(midir::MidiInputPort, String)> {
        let pattern = pattern.to_lowercase();
        midi_in.ports().into_iter().find_map(|port| {
            let name = midi_in.port_name(&port).ok()?;
            if name.to_lowercase().contains(&pattern) {
                debug!("Found input port '{}' matching '{}'", name, pattern);
                Some((port, name))
            } else {
                None
            }
        })
    }

    fn find_output_port(
        midi_out: &MidiOutput,
        pattern: &str,
    ) -> Option<(midir::MidiOutputPort, String)> {
        let pattern = pattern.to_lowercase();
        midi_out.ports().into_iter().find_map(|port| {
            let name = midi_out.port_name(&port).ok()?;
            if name.to_lowercase().contains(&pattern) {
                debug!("Found output port '{}' matching '{}'", name, pattern);
                Some((port, name))
            } else {
                None
            }
        })
    }

    /// Open both surface ports, dropping any previous connection
    pub fn connect(&mut self) -> Result<()> {
        self.disconnect();

        info!(
            "Connecting to APC - Input: '{}', Output: '{}'",
            self.input_port_name, self.output_port_name
        );

        let midi_in = MidiInput::new("APC-Looper-GW-Input").context("Failed to create MIDI input")?;
        debug!("Found {} MIDI input ports", midi_in.port_count());

        let (in_port, port_name) = Self::find_input_port(&midi_in, &self.input_port_name)
            .ok_or_else(|| anyhow::anyhow!("Input port '{}' not found", self.input_port_name))?;
        info!("Connecting to input port: {}", port_name);

        let event_tx = self.event_tx.clone();
        let input_conn = midi_in
            .connect(
                &in_port,
                "APC-Looper-GW",
                move |_timestamp, data, _| {
                    let event = SurfaceEvent {
                        timestamp: Instant::now(),
                        raw_data: data.to_vec(),
                    };
                    // never block the MIDI thread
                    if event_tx.try_send(event).is_err() {
                        debug!("Surface event dropped: {}", format_hex(data));
                    }
                },
                (),
            )
            .map_err(|e| anyhow::anyhow!("Failed to connect to input port: {}", e))?;
        self.input_conn = Some(input_conn);

        let midi_out =
            MidiOutput::new("APC-Looper-GW-Output").context("Failed to create MIDI output")?;
        debug!("Found {} MIDI output ports", midi_out.port_count());

        let (out_port, port_name) = Self::find_output_port(&midi_out, &self.output_port_name)
            .ok_or_else(|| anyhow::anyhow!("Output port '{}' not found", self.output_port_name))?;
        info!("Connecting to output port: {}", port_name);

        let output_conn = midi_out
            .connect(&out_port, "APC-Looper-GW")
            .map_err(|e| anyhow::anyhow!("Failed to connect to output port: {}", e))?;
        self.output_conn = Some(Arc::new(Mutex::new(output_conn)));

        info!("APC connected");
        Ok(())
    }

    pub fn disconnect(&mut self) {
        if self.is_connected() {
            info!("APC disconnected");
        }
        self.input_conn = None;
        self.output_conn = None;
    }

    pub fn is_connected(&self) -> bool {
        self.input_conn.is_some() && self.output_conn.is_some()
    }

    /// Send raw MIDI bytes to the surface
    pub fn send_raw(&self, data: &[u8]) -> Result<()> {
        let output = self
            .output_conn
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("Not connected to output port"))?;

        let mut conn = output
            .lock()
            .map_err(|_| anyhow::anyhow!("MIDI output lock poisoned"))?;
        conn.send(data).context("Failed to send MIDI data")?;

        trace!("Sent raw: {}", format_hex(data));
        Ok(())
    }

    /// Write a batch of pad cells as one buffer
    pub fn send_cells(&mut self, cells: &[LedCell]) -> Result<()> {
        if cells.is_empty() {
            return Ok(());
        }
        let data = encode_batch(cells);
        if let Err(e) = self.send_raw(&data) {
            warn!("LED batch of {} cells failed, dropping surface connection", cells.len());
            self.disconnect();
            return Err(e);
        }
        debug!("Sent {} LED cells", cells.len());
        Ok(())
    }

    /// Take the event receiver (for the main loop to consume)
    pub fn take_event_receiver(&mut self) -> Option<mpsc::Receiver<SurfaceEvent>> {
        self.event_rx.take()
    }
}

/// Port discovery utilities
pub mod discovery {
    use super::*;
    use colored::*;

    /// Information about a MIDI port
    #[derive(Debug, Clone)]
    pub struct PortInfo {
        pub index: usize,
        pub name: String,
        pub is_virtual: bool,
    }

    fn is_virtual(name: &str) -> bool {
        name.contains("Virtual") || name.contains("loopMIDI") || name.contains("IAC")
    }

    /// Discover all available MIDI ports
    pub fn discover_all_ports() -> Result<(Vec<PortInfo>, Vec<PortInfo>)> {
        Ok((discover_input_ports()?, discover_output_ports()?))
    }

    pub fn discover_input_ports() -> Result<Vec<PortInfo>> {
        let midi_in = MidiInput::new("APC-Looper-GW-Discovery")?;
        Ok(midi_in
            .ports()
            .iter()
            .enumerate()
            .filter_map(|(index, port)| {
                let name = midi_in.port_name(port).ok()?;
                Some(PortInfo {
                    index,
                    is_virtual: is_virtual(&name),
                    name,
                })
            })
            .collect())
    }

    pub fn discover_output_ports() -> Result<Vec<PortInfo>> {
        let midi_out = MidiOutput::new("APC-Looper-GW-Discovery")?;
        Ok(midi_out
            .ports()
            .iter()
            .enumerate()
            .filter_map(|(index, port)| {
                let name = midi_out.port_name(port).ok()?;
                Some(PortInfo {
                    index,
                    is_virtual: is_virtual(&name),
                    name,
                })
            })
            .collect())
    }

    /// Find an APC input/output pair automatically
    pub fn find_apc_ports() -> Option<(String, String)> {
        let patterns = ["APC Key 25", "APC KEY 25", "APC"];

        let (inputs, outputs) = discover_all_ports().ok()?;
        patterns.iter().find_map(|pattern| {
            let input = inputs
                .iter()
                .find(|p| p.name.contains(pattern) && !p.is_virtual)?;
            let output = outputs
                .iter()
                .find(|p| p.name.contains(pattern) && !p.is_virtual)?;
            Some((input.name.clone(), output.name.clone()))
        })
    }

    fn print_section(title: &str, ports: Result<Vec<PortInfo>>) {
        println!("\n{}", title.bold());
        match ports {
            Ok(ports) if ports.is_empty() => println!("  {}", "No ports found".dimmed()),
            Ok(ports) => {
                for port in ports {
                    let tag = if port.is_virtual {
                        "[VIRTUAL]".yellow()
                    } else {
                        "[PHYSICAL]".green()
                    };
                    println!("  {}: {} {}", port.index, port.name, tag);
                }
            }
            Err(e) => println!("  {}", format!("Failed to list ports: {}", e).red()),
        }
    }

    /// Print discovered ports, highlighting a detected APC
    pub fn print_ports() {
        println!("\n{}", "=== Available MIDI Ports ===".bold().cyan());
        print_section("Input Ports:", discover_input_ports());
        print_section("Output Ports:", discover_output_ports());

        match find_apc_ports() {
            Some((input, output)) => println!(
                "\n{} in: {}, out: {}",
                "APC detected".green().bold(),
                input,
                output
            ),
            None => println!("\n{}", "No APC Key 25 found".yellow()),
        }
        println!();
    }
}
