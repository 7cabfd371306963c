//! take-recorder - terminal host for recorder-core on cpal devices

use std::io::{self, BufRead, Write};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use recorder_core::{
    AudioArtifact, ControlState, CropFeedback, MeterSample, Mode, RecorderDelegate, RecorderError,
    SoundRecorder, Surface, TickToken, TrimOutcome,
};
use recorder_cpal::cli::{self, Args, Command};
use recorder_cpal::{CpalCaptureBackend, CpalPlaybackBackend};

/// How often the loop checks for the end of a crop preview.
const IDLE_POLL: Duration = Duration::from_millis(50);

const METER_WIDTH: usize = 30;

/// Everything the main loop reacts to, funnelled through one channel so the
/// recorder is only ever touched from this thread.
enum Message {
    Line(String),
    Tick(TickToken),
    TrimFinished,
    InputClosed,
}

/// Prints recorder feedback to the terminal.
struct ConsoleDelegate;

impl RecorderDelegate for ConsoleDelegate {
    fn on_mode_changed(&self, mode: Mode) {
        println!();
        println!("[{:?}]", mode);
    }

    fn on_meter(&self, sample: &MeterSample) {
        let filled = (sample.level.clamp(0.0, 1.0) * METER_WIDTH as f32).round() as usize;
        let clock = if sample.warning {
            format!("-{}!", sample.clock_label())
        } else {
            sample.clock_label()
        };
        print!(
            "\r{:>7} |{}{}|",
            clock,
            "#".repeat(filled),
            " ".repeat(METER_WIDTH - filled)
        );
        let _ = io::stdout().flush();
    }

    fn on_surface_changed(&self, surface: Surface, artifact: Option<&AudioArtifact>) {
        if let (Surface::Waveform, Some(artifact)) = (surface, artifact) {
            println!("crop {} ({:.2}s)", artifact.path.display(), artifact.duration_secs);
        }
    }

    fn on_controls_changed(&self, controls: &ControlState) {
        log::debug!("Controls: {:?}", controls);
    }

    fn on_crop_changed(&self, feedback: &CropFeedback) {
        println!(
            "range {:.2}s..{:.2}s ({:.2}s){}",
            feedback.range.left(),
            feedback.range.right(),
            feedback.range.length(),
            if feedback.commit_enabled { "" } else { " - too short to trim" }
        );
    }

    fn on_artifact_changed(&self, artifact: &AudioArtifact) {
        println!();
        println!("take: {} ({:.2}s)", artifact.path.display(), artifact.duration_secs);
    }

    fn on_trim_finished(&self, outcome: &TrimOutcome) {
        match outcome {
            TrimOutcome::Succeeded(artifact) => println!("trimmed to {:.2}s", artifact.duration_secs),
            TrimOutcome::Failed(reason) => println!("trim failed: {}", reason),
            TrimOutcome::Cancelled => println!("trim cancelled"),
        }
    }

    fn on_error(&self, error: &RecorderError) {
        println!();
        eprintln!("error: {}", error);
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    cli::init_logging(&args);

    let config = args.recorder_config().context("invalid configuration")?;
    std::fs::create_dir_all(&config.storage_root)
        .with_context(|| format!("failed to create {}", config.storage_root.display()))?;
    log::info!("Storing takes under {}", config.storage_root.display());

    let mut recorder = SoundRecorder::new(config, CpalCaptureBackend::new(), CpalPlaybackBackend::new())?;

    let (tx, rx) = mpsc::channel::<Message>();

    let tick_tx = tx.clone();
    recorder.set_tick_callback(Arc::new(move |token| {
        let _ = tick_tx.send(Message::Tick(token));
    }));

    let wake_tx = tx.clone();
    recorder.set_trim_wake(Arc::new(move || {
        let _ = wake_tx.send(Message::TrimFinished);
    }));

    thread::Builder::new()
        .name("stdin-reader".into())
        .spawn(move || read_commands(tx))
        .context("failed to spawn stdin reader")?;

    recorder.set_delegate(Arc::new(ConsoleDelegate));
    println!("{}", cli::HELP);

    loop {
        match rx.recv_timeout(IDLE_POLL) {
            Ok(Message::Tick(token)) => recorder.on_tick(token),
            Ok(Message::TrimFinished) => recorder.poll_trim(),
            Ok(Message::Line(line)) => match Command::parse(&line) {
                Ok(Some(command)) => run_command(&mut recorder, command),
                Ok(None) => {}
                Err(e) => eprintln!("{}", e),
            },
            Ok(Message::InputClosed) | Err(RecvTimeoutError::Disconnected) => {
                log::info!("Input closed, discarding takes");
                recorder.cancel();
            }
            Err(RecvTimeoutError::Timeout) => recorder.poll_playback(),
        }

        if recorder.is_torn_down() {
            break;
        }
    }

    Ok(())
}

fn run_command<C, P>(recorder: &mut SoundRecorder<C, P>, command: Command)
where
    C: recorder_core::CaptureBackend,
    P: recorder_core::PlaybackBackend,
{
    match command {
        Command::ToggleRecord => recorder.toggle_record(),
        Command::Stop => recorder.stop_record(),
        Command::TogglePlay => recorder.toggle_play(),
        Command::EnterCrop => recorder.enter_crop(),
        Command::ExitCrop => recorder.exit_crop(),
        Command::DragLeft(p) => recorder.drag_left(p),
        Command::DragRight(p) => recorder.drag_right(p),
        Command::Trim => recorder.commit_trim(),
        Command::Done => match recorder.finish() {
            Some(path) => println!("saved {}", path.display()),
            None => eprintln!("nothing to keep yet"),
        },
        Command::Quit => recorder.cancel(),
        Command::Help => println!("{}", cli::HELP),
    }
}

fn read_commands(tx: mpsc::Sender<Message>) {
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        match line {
            Ok(line) => {
                if tx.send(Message::Line(line)).is_err() {
                    return;
                }
            }
            Err(e) => {
                log::error!("Failed to read stdin: {}", e);
                break;
            }
        }
    }
    let _ = tx.send(Message::InputClosed);
}
