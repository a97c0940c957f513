mod console;

use std::{cell::Cell, path::PathBuf, rc::Rc, time::Duration};

use clap::{Parser, Subcommand};
use fretboard_trainer_core::{
    AppConfig, ArpeggioDirection, ChordKind, ChordPosition, Fretboard, Intent, LazyAudio,
    ManualTimer, Mode, PatternId, PitchClass, ScaleKind, Signature, Subdivision, Trainer,
};
use tracing_subscriber::EnvFilter;

use console::{ConsoleAudio, TextSink};

type ConsoleTrainer = Trainer<ManualTimer, ConsoleAudio, TextSink>;

fn main() -> fretboard_trainer_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };

    match cli.command {
        Commands::Board(args) => run_board(&config, args),
        Commands::Rhythm {
            signature,
            subdivision,
            bpm,
            bars,
            mute,
            dark,
        } => run_rhythm(&config, signature, subdivision, bpm, bars, mute, dark),
        Commands::Metronome { bpm, seconds } => run_metronome(&config, bpm, seconds),
    }
}

fn build_trainer(config: &AppConfig) -> (ConsoleTrainer, Rc<Cell<f64>>) {
    let clock = Rc::new(Cell::new(0.0));
    let audio_clock = clock.clone();
    let trainer = Trainer::new(
        config,
        ManualTimer::new(),
        LazyAudio::new(move || ConsoleAudio::new(audio_clock.clone())),
        TextSink::new(&Fretboard::standard()),
    );
    (trainer, clock)
}

/// Fires every timer expiry up to `duration` from now, keeping the audio clock
/// in step with the simulated time.
fn simulate(trainer: &mut ConsoleTrainer, clock: &Cell<f64>, duration: Duration) {
    let deadline = trainer.timer_mut().now() + duration;
    while let Some(firing) = trainer.timer_mut().fire_next(deadline) {
        clock.set(firing.at.as_secs_f64());
        trainer.handle_timer(firing.id);
    }
    trainer.timer_mut().settle(deadline);
    clock.set(deadline.as_secs_f64());
}

fn run_board(config: &AppConfig, args: BoardArgs) -> fretboard_trainer_core::Result<()> {
    tracing::info!(mode = %args.mode, "rendering board");
    let (mut trainer, _) = build_trainer(config);

    let mut training = Vec::new();
    training.extend(args.root.map(Intent::SetRoot));
    training.extend(args.scale.map(Intent::SetScale));
    training.extend(args.chord.map(Intent::SetChord));
    training.extend(args.direction.map(Intent::SetArpeggioDirection));
    if let Some(number) = args.position {
        training.push(Intent::SetChordPosition(ChordPosition::try_from(number)?));
    }
    if args.scale_on {
        training.push(Intent::SetScaleOn(true));
    }
    if args.chord_tones {
        training.push(Intent::SetChordToneOn(true));
    }
    if args.arpeggio {
        training.push(Intent::SetArpeggioOn(true));
    }
    if args.no_root {
        training.push(Intent::SetHighlightRootOn(false));
    }
    for intent in training {
        trainer.dispatch(intent)?;
    }

    trainer.dispatch(Intent::SetMode(args.mode))?;
    for number in &args.patterns {
        trainer.dispatch(Intent::TogglePattern(PatternId::try_from(*number)?))?;
    }
    if args.caged {
        trainer.dispatch(Intent::SetCagedOn(true))?;
    }

    let controls = trainer.controls();
    println!(
        "{} {} / {} ({} mode)",
        controls.root,
        controls.scale.name(),
        controls.chord.name(),
        trainer.mode()
    );
    println!("{}", trainer.sink().draw_board(trainer.board(), args.degrees));
    Ok(())
}

fn run_rhythm(
    config: &AppConfig,
    signature: Option<Signature>,
    subdivision: Option<Subdivision>,
    bpm: Option<u32>,
    bars: u32,
    mute: bool,
    dark: bool,
) -> fretboard_trainer_core::Result<()> {
    let (mut trainer, clock) = build_trainer(config);
    trainer.dispatch(Intent::SetMode(Mode::Rhythm))?;

    let mut intents = Vec::new();
    intents.extend(signature.map(Intent::SetSignature));
    intents.extend(subdivision.map(Intent::SetSubdivision));
    intents.extend(bpm.map(Intent::SetRhythmBpm));
    if mute {
        intents.push(Intent::SetRhythmSoundOn(false));
    }
    if dark {
        intents.push(Intent::SetRhythmLightOn(false));
    }
    for intent in intents {
        trainer.dispatch(intent)?;
    }

    let rhythm = *trainer.rhythm().config();
    tracing::info!(
        signature = %rhythm.signature,
        subdivision = rhythm.subdivision.name(),
        bpm = rhythm.bpm,
        bars,
        "starting rhythm trainer"
    );

    trainer.dispatch(Intent::StartRhythm)?;
    let steps = (rhythm.total_steps() as u32 * bars).saturating_sub(1);
    simulate(&mut trainer, &clock, rhythm.step_interval() * steps);
    trainer.dispatch(Intent::StopRhythm)?;
    Ok(())
}

fn run_metronome(
    config: &AppConfig,
    bpm: Option<u32>,
    seconds: f64,
) -> fretboard_trainer_core::Result<()> {
    let (mut trainer, clock) = build_trainer(config);
    if let Some(bpm) = bpm {
        trainer.dispatch(Intent::SetMetronomeBpm(bpm))?;
    }
    tracing::info!(bpm = trainer.metronome().config().bpm, seconds, "starting metronome");

    trainer.dispatch(Intent::StartMetronome)?;
    simulate(&mut trainer, &clock, Duration::from_secs_f64(seconds.max(0.0)));
    trainer.dispatch(Intent::StopMetronome)?;
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Guitar fretboard and rhythm trainer", long_about = None)]
struct Cli {
    /// JSON configuration with startup values.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the classified fretboard for a set of controls.
    Board(BoardArgs),
    /// Simulate the rhythm trainer and print every tick.
    Rhythm {
        /// Time signature: 3/4, 4/4 or 6/8.
        #[arg(short, long)]
        signature: Option<Signature>,
        /// quarter, eighth or sixteenth.
        #[arg(long)]
        subdivision: Option<Subdivision>,
        #[arg(short, long)]
        bpm: Option<u32>,
        /// Number of bars to play.
        #[arg(long, default_value_t = 2)]
        bars: u32,
        /// Disable the click sound.
        #[arg(long)]
        mute: bool,
        /// Disable the step lights.
        #[arg(long)]
        dark: bool,
    },
    /// Simulate the look-ahead metronome and print every scheduled pulse.
    Metronome {
        #[arg(short, long)]
        bpm: Option<u32>,
        /// Simulated running time.
        #[arg(long, default_value_t = 2.0)]
        seconds: f64,
    },
}

#[derive(clap::Args, Debug)]
struct BoardArgs {
    /// training or caged.
    #[arg(short, long, default_value = "training")]
    mode: Mode,
    #[arg(short, long)]
    root: Option<PitchClass>,
    #[arg(short, long)]
    scale: Option<ScaleKind>,
    #[arg(long)]
    chord: Option<ChordKind>,
    /// Show the selected scale.
    #[arg(long)]
    scale_on: bool,
    /// Show chord tones inside the chord position.
    #[arg(long)]
    chord_tones: bool,
    /// Chord position 1-5.
    #[arg(short, long)]
    position: Option<u8>,
    /// Number the arpeggio path.
    #[arg(long)]
    arpeggio: bool,
    /// asc or desc.
    #[arg(long)]
    direction: Option<ArpeggioDirection>,
    /// Do not highlight the root.
    #[arg(long)]
    no_root: bool,
    /// CAGED patterns to select in caged mode, e.g. 1,3.
    #[arg(long, value_delimiter = ',')]
    patterns: Vec<u8>,
    /// Show the CAGED chord-tone overlay in caged mode.
    #[arg(long)]
    caged: bool,
    /// Label cells with chord degrees instead of note names.
    #[arg(long)]
    degrees: bool,
}
