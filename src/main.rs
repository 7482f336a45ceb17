use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use crossbeam_channel::{RecvTimeoutError, unbounded};
use ringbuf::traits::Consumer;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use pulse_metronome::audio::engine::list_output_devices;
use pulse_metronome::audio::export::{export_click_track, export_sound_bank};
use pulse_metronome::config::default_config_path;
use pulse_metronome::messaging::channels::NotificationConsumer;
use pulse_metronome::preset::SLOT_COUNT;
use pulse_metronome::{
    CpalOutput, EngineConfig, Metronome, NotificationKind, PresetStore, Settings, SoundType,
    Subdivision, SystemClock, TransportState, VisualSink, VisualState, create_notification_channel,
};

#[derive(Parser)]
#[command(name = "pulse_metronome")]
#[command(about = "Look-ahead scheduled metronome with subdivisions, timer and tempo ramps")]
struct Cli {
    /// Engine configuration file (RON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Play the metronome (interactive)
    Run {
        #[command(flatten)]
        settings: SettingsArgs,

        /// Load a preset slot before applying other options
        #[arg(long)]
        preset: Option<u8>,

        /// Tempo ramp: START_BPM END_BPM MINUTES
        #[arg(long, num_args = 3, value_names = ["START", "END", "MINUTES"])]
        ramp: Option<Vec<u32>>,

        /// Output device name
        #[arg(long)]
        device: Option<String>,
    },

    /// List preset slots
    Presets,

    /// List subdivision patterns
    Subdivisions,

    /// List audio output devices
    Devices,

    /// Render a click track to a WAV file
    ExportClick {
        #[command(flatten)]
        settings: SettingsArgs,

        /// Output file
        #[arg(short, long, default_value = "click_track.wav")]
        output: PathBuf,

        /// Length in seconds
        #[arg(long, default_value = "30")]
        seconds: f64,

        #[arg(long, default_value = "44100")]
        sample_rate: u32,
    },

    /// Write the pregenerated click sounds as WAV files
    ExportSounds {
        #[arg(default_value = "sounds")]
        dir: PathBuf,

        #[arg(long, default_value = "44100")]
        sample_rate: u32,
    },
}

#[derive(Args, Default)]
struct SettingsArgs {
    /// Tempo in BPM (40-400)
    #[arg(short, long)]
    tempo: Option<i64>,

    /// Subdivision id (see `subdivisions`)
    #[arg(short, long)]
    subdivision: Option<String>,

    /// Time signature, e.g. 3/4
    #[arg(long, value_parser = parse_time_signature)]
    time_signature: Option<(u32, u32)>,

    /// click, woodblock, cowbell or hihat
    #[arg(long)]
    sound: Option<String>,

    /// Volume 0.0-1.0
    #[arg(long)]
    volume: Option<f32>,

    /// Disable the downbeat accent
    #[arg(long)]
    no_accent: bool,

    /// Practice timer as MM:SS or seconds
    #[arg(long, value_parser = parse_timer)]
    timer: Option<(u32, u32)>,
}

impl SettingsArgs {
    fn apply(&self, settings: &mut Settings) {
        if let Some(bpm) = self.tempo {
            settings.set_tempo(bpm);
        }
        if let Some(id) = &self.subdivision {
            settings.set_subdivision_id(id);
        }
        if let Some((n, d)) = self.time_signature {
            settings.set_time_signature(n, d);
        }
        if let Some(id) = &self.sound {
            settings.set_sound_id(id);
        }
        if let Some(volume) = self.volume {
            settings.set_volume(volume);
        }
        if self.no_accent {
            settings.set_accent(false);
        }
        if let Some((m, s)) = self.timer {
            settings.set_timer(m, s);
        }
    }
}

fn parse_time_signature(s: &str) -> Result<(u32, u32), String> {
    let (n, d) = s
        .split_once('/')
        .ok_or_else(|| format!("expected N/D, got '{}'", s))?;
    let n = n.trim().parse().map_err(|e| format!("numerator: {}", e))?;
    let d = d.trim().parse().map_err(|e| format!("denominator: {}", e))?;
    Ok((n, d))
}

fn parse_timer(s: &str) -> Result<(u32, u32), String> {
    match s.split_once(':') {
        Some((m, sec)) => {
            let m = m.trim().parse().map_err(|e| format!("minutes: {}", e))?;
            let sec = sec.trim().parse().map_err(|e| format!("seconds: {}", e))?;
            Ok((m, sec))
        }
        None => {
            let total: u32 = s.trim().parse().map_err(|e| format!("seconds: {}", e))?;
            Ok((total / 60, total % 60))
        }
    }
}

/// Beat indicator on the terminal
struct TerminalVisual;

impl VisualSink for TerminalVisual {
    fn visual_changed(&mut self, state: VisualState) {
        if state.active {
            print!("{}", if state.accent { "X " } else { "o " });
            let _ = std::io::stdout().flush();
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("pulse_metronome=info")),
        )
        .init();

    let cli = Cli::parse();

    let config = match cli.config.clone().or_else(default_config_path) {
        Some(path) => EngineConfig::load_or_default(&path),
        None => EngineConfig::default(),
    };

    let preset_store = match config.preset_dir.clone() {
        Some(dir) => Some(PresetStore::new(dir)),
        None => PresetStore::open_default()
            .inspect_err(|e| tracing::warn!("Presets disabled: {}", e))
            .ok(),
    };

    match cli.command.unwrap_or(Commands::Run {
        settings: SettingsArgs::default(),
        preset: None,
        ramp: None,
        device: None,
    }) {
        Commands::Run {
            settings,
            preset,
            ramp,
            device,
        } => run(&config, preset_store, &settings, preset, ramp, device)?,

        Commands::Presets => match &preset_store {
            Some(store) => {
                for (slot, summary) in store.list() {
                    println!("{}: {}", slot, summary.as_deref().unwrap_or("(empty)"));
                }
            }
            None => println!("No preset directory available"),
        },

        Commands::Subdivisions => {
            for subdivision in Subdivision::ALL {
                println!(
                    "{:<24} {:<28} {:?}",
                    subdivision.id(),
                    subdivision.label(),
                    subdivision.pattern()
                );
            }
        }

        Commands::Devices => {
            for name in list_output_devices() {
                println!("{}", name);
            }
        }

        Commands::ExportClick {
            settings: args,
            output,
            seconds,
            sample_rate,
        } => {
            let mut settings = Settings::default();
            args.apply(&mut settings);
            let summary = export_click_track(&settings, seconds, sample_rate, &output)?;
            println!(
                "Wrote {} clicks ({} samples) to {}",
                summary.clicks,
                summary.samples,
                output.display()
            );
        }

        Commands::ExportSounds { dir, sample_rate } => {
            let files = export_sound_bank(&dir, sample_rate)?;
            for file in files {
                println!("{}", file.display());
            }
        }
    }

    Ok(())
}

fn run(
    config: &EngineConfig,
    preset_store: Option<PresetStore>,
    args: &SettingsArgs,
    preset: Option<u8>,
    ramp: Option<Vec<u32>>,
    device: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let (notification_tx, mut notification_rx) =
        create_notification_channel(config.notification_capacity);
    let notification_tx = Arc::new(Mutex::new(notification_tx));

    let output = CpalOutput::new(
        notification_tx.clone(),
        device.or_else(|| config.output_device.clone()),
        config.click_queue_capacity,
    );

    let mut metronome = Metronome::new(
        Box::new(output),
        Box::new(SystemClock::new()),
        notification_tx,
    )
    .with_timing(config.scheduler_timing())
    .with_visual_sink(Box::new(TerminalVisual));

    if let (Some(slot), Some(store)) = (preset, preset_store.as_ref()) {
        match store.load(slot) {
            Some(record) => metronome.apply_settings(&record),
            None => println!("Preset {} is empty", slot),
        }
    }

    let mut settings = *metronome.settings();
    args.apply(&mut settings);
    metronome.apply_settings(&settings.to_record());

    match ramp.as_deref() {
        Some([start, end, minutes]) => metronome.start_ramp(*start, *end, *minutes)?,
        _ => metronome.start()?,
    }

    print_status(&metronome);
    println!("Commands: <enter> start/stop, t tap, + - ++ --, bpm N, sub ID, ts N/D,");
    println!("          sound ID, vol X, accent, timer M S, ramp A B MIN, ramp stop,");
    println!("          save N, load N, status, q");

    // Stdin is read on its own thread; the event loop stays single-threaded
    let (line_tx, line_rx) = unbounded::<String>();
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(line) => {
                    if line_tx.send(line).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        }
    });

    loop {
        metronome.poll();
        drain_notifications(&mut notification_rx);

        let wait = metronome
            .time_until_next()
            .unwrap_or(Duration::from_millis(100))
            .min(Duration::from_millis(100));

        match line_rx.recv_timeout(wait) {
            Ok(line) => {
                if !handle_command(&mut metronome, preset_store.as_ref(), line.trim()) {
                    break;
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    metronome.stop();
    Ok(())
}

/// Returns false to quit
fn handle_command(metronome: &mut Metronome, store: Option<&PresetStore>, line: &str) -> bool {
    let mut parts = line.split_whitespace();
    let command = parts.next().unwrap_or("");
    let args: Vec<&str> = parts.collect();
    let number = |i: usize| args.get(i).and_then(|a| a.parse::<i64>().ok());

    match command {
        "" | "p" => match metronome.toggle() {
            Ok(TransportState::Running) => println!("\nStarted"),
            Ok(TransportState::Stopped) => println!("\nStopped"),
            Err(e) => println!("\n{}", e),
        },
        "q" | "quit" => return false,
        "t" | "tap" => match metronome.tap_tempo() {
            Some(tempo) => println!("\n{}", tempo),
            None => println!("\nTap again..."),
        },
        "+" | "-" | "++" | "--" => {
            let step = match command {
                "+" => 1,
                "-" => -1,
                "++" => 10,
                _ => -10,
            };
            let bpm = metronome.tempo().bpm() as i64 + step;
            metronome.set_tempo(bpm);
            println!("\n{}", metronome.tempo());
        }
        "bpm" => match number(0) {
            Some(bpm) => {
                metronome.set_tempo(bpm);
                println!("\n{}", metronome.tempo());
            }
            None => println!("\nUsage: bpm N"),
        },
        "sub" => match args.first() {
            Some(id) if metronome.set_subdivision_id(id) => println!("\n{}", id),
            _ => println!("\nUnknown subdivision (see `subdivisions`)"),
        },
        "ts" => match args.first().map(|s| parse_time_signature(s)) {
            Some(Ok((n, d))) => {
                metronome.set_time_signature(n, d);
                println!("\n{}", metronome.settings().time_signature());
            }
            _ => println!("\nUsage: ts N/D"),
        },
        "sound" => match args.first().and_then(|s| SoundType::from_id(s)) {
            Some(sound) => metronome.set_sound(sound),
            None => println!("\nUsage: sound click|woodblock|cowbell|hihat"),
        },
        "vol" => match args.first().and_then(|v| v.parse::<f32>().ok()) {
            Some(volume) => metronome.set_volume(volume),
            None => println!("\nUsage: vol 0.0-1.0"),
        },
        "accent" => {
            let enabled = !metronome.settings().accent();
            metronome.set_accent(enabled);
            println!("\nAccent {}", if enabled { "on" } else { "off" });
        }
        "timer" => match (number(0), number(1)) {
            (Some(m), s) => {
                let clamp = |v: i64| v.clamp(0, u32::MAX as i64) as u32;
                metronome.set_timer(clamp(m), clamp(s.unwrap_or(0)));
                println!("\nTimer set, applies at next start");
            }
            _ => println!("\nUsage: timer M S"),
        },
        "ramp" if args.first() == Some(&"stop") => {
            if !metronome.stop_ramp() {
                println!("\nNo ramp in progress");
            }
        }
        "ramp" => match (number(0), number(1), number(2)) {
            (Some(a), Some(b), Some(m)) => {
                let clamp = |v: i64| v.clamp(0, u32::MAX as i64) as u32;
                if let Err(e) = metronome.start_ramp(clamp(a), clamp(b), clamp(m)) {
                    println!("\n{}", e);
                }
            }
            _ => println!("\nUsage: ramp START END MINUTES"),
        },
        "save" | "load" => {
            let Some(store) = store else {
                println!("\nNo preset directory available");
                return true;
            };
            let Some(slot) = number(0).filter(|s| (1..=SLOT_COUNT as i64).contains(s)) else {
                println!("\nSlot must be 1-{}", SLOT_COUNT);
                return true;
            };
            let slot = slot as u8;
            if command == "save" {
                match store.save(slot, &metronome.get_settings()) {
                    Ok(()) => println!("\nSaved preset {}", slot),
                    Err(e) => println!("\n{}", e),
                }
            } else {
                match store.load(slot) {
                    Some(record) => {
                        metronome.apply_settings(&record);
                        print_status(metronome);
                    }
                    None => println!("\nPreset {} is empty", slot),
                }
            }
        }
        "status" => print_status(metronome),
        other => println!("\nUnknown command '{}'", other),
    }
    true
}

fn print_status(metronome: &Metronome) {
    let settings = metronome.settings();
    println!(
        "\n{} | {} | {} | {} | vol {:.2} | accent {}",
        settings.tempo(),
        settings.time_signature(),
        settings.subdivision().label(),
        settings.sound(),
        settings.volume(),
        if settings.accent() { "on" } else { "off" }
    );
    if let Some(remaining) = metronome.timer_remaining() {
        println!("Timer: {:.0}s left", remaining);
    }
    if let Some(ramp) = metronome.active_ramp() {
        println!(
            "Ramp: {} -> {} BPM over {} min",
            ramp.start_bpm(),
            ramp.end_bpm(),
            ramp.minutes()
        );
    }
}

fn drain_notifications(rx: &mut NotificationConsumer) {
    while let Some(notification) = rx.try_pop() {
        let message = match notification.kind {
            NotificationKind::TimerExpired => "Time is up. Take a break!",
            NotificationKind::RampStarted => "Tempo ramp started",
            NotificationKind::RampCompleted => "Tempo ramp complete",
            NotificationKind::RampCancelled => "Tempo ramp cancelled",
            NotificationKind::AudioConnected => "Audio connected",
            NotificationKind::AudioStreamError => "Audio stream error",
        };
        println!("\n[{}] {}", notification.name(), message);
    }
}
