#[cfg(test)]
#[path = "main_test.rs"]
mod main_test;

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Read};
use std::rc::Rc;

use clap::{Args, Parser, Subcommand, ValueEnum};
use gesture_engine::{
    Action, Adsorption, AdsorptionConfig, Contact, ContactSnapshot, GestureConfig, GestureDetector, GestureState,
    ImmunityMode, Magnet, MagneticBody, MoveListener, Point, Rect, RotateListener, ScaleListener, TargetId,
    TouchListener,
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("failed to read {path}: {source}")]
    Read { path: String, source: io::Error },
    #[error("invalid script: {0}")]
    Script(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    Config(#[from] gesture_engine::ConfigError),
    #[error("step {index}: {source}")]
    Frame {
        index: usize,
        source: gesture_engine::GestureError,
    },
    #[error("body target {0} is missing from rects")]
    MissingBody(TargetId),
}

#[derive(Parser, Debug)]
#[command(name = "gesture-cli", about = "Replay contact and drag scripts through the gesture engine")]
struct Cli {
    /// JSON file with a full detector configuration. Replaces the `GESTURE_*` settings entirely.
    #[arg(long, env = "GESTURE_CONFIG")]
    config: Option<String>,

    /// Override whether a lone tap waits for a possible second tap. Accepts `1/0`, `yes/no`, `on/off`.
    #[arg(long, env = "GESTURE_DOUBLE_CLICK", value_parser = clap::builder::BoolishValueParser::new())]
    double_click: Option<bool>,

    #[arg(long, env = "GESTURE_IMMUNITY_MODE", value_enum, default_value = "alignment")]
    immunity_mode: ImmunityArg,

    /// Tracing filter, e.g. `gesture_engine=debug`.
    #[arg(long, env = "GESTURE_LOG", default_value = "warn")]
    log: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ImmunityArg {
    Alignment,
    Raw,
}

impl From<ImmunityArg> for ImmunityMode {
    fn from(arg: ImmunityArg) -> Self {
        match arg {
            ImmunityArg::Alignment => ImmunityMode::AlignmentDistance,
            ImmunityArg::Raw => ImmunityMode::RawMotion,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Feed contact frames and ticks through a detector; print one JSON line per callback.
    Replay(ScriptArgs),
    /// Drag a body past magnets; print one JSON line per frame.
    Snap(ScriptArgs),
}

#[derive(Args, Debug)]
struct ScriptArgs {
    /// Script path, or `-` for stdin.
    #[arg(default_value = "-")]
    input: String,
}

fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cli.log))
        .with_writer(io::stderr)
        .init();

    match &cli.command {
        Command::Replay(args) => run_replay(&cli, &read_input(&args.input)?),
        Command::Snap(args) => run_snap(&cli, &read_input(&args.input)?),
    }
}

fn read_input(input: &str) -> Result<String, CliError> {
    let mut text = String::new();
    let result = if input == "-" {
        io::stdin().read_to_string(&mut text)
    } else {
        File::open(input).and_then(|mut file| file.read_to_string(&mut text))
    };
    result.map_err(|source| CliError::Read { path: input.to_owned(), source })?;
    Ok(text)
}

fn gesture_config(cli: &Cli) -> Result<GestureConfig, CliError> {
    let mut config = match &cli.config {
        Some(path) => GestureConfig::from_json(&read_input(path)?)?,
        None => GestureConfig::from_env()?,
    };
    if let Some(enabled) = cli.double_click {
        config.double_click_enabled = enabled;
    }
    Ok(config)
}

// =============================================================
// Replay
// =============================================================

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ReplayStep {
    Tick {
        tick: u64,
    },
    Frame {
        action: Action,
        contacts: Vec<Contact>,
        #[serde(default)]
        time_ms: u64,
    },
}

#[derive(Debug, Deserialize)]
struct ReplayScript {
    #[serde(default = "default_view")]
    view: Rect,
    steps: Vec<ReplayStep>,
}

fn default_view() -> Rect {
    Rect::new(0.0, 0.0, 1080.0, 1920.0)
}

/// Callback lines collected during one intake call.
#[derive(Clone, Default)]
struct Journal(Rc<RefCell<Vec<Value>>>);

impl Journal {
    fn record(&self, event: &str, state: &GestureState, extra: Value) {
        let mut line = json!({
            "event": event,
            "x": state.touch_x(),
            "y": state.touch_y(),
        });
        if let (Some(line), Value::Object(extra)) = (line.as_object_mut(), extra) {
            line.extend(extra);
        }
        self.0.borrow_mut().push(line);
    }

    fn drain(&self) -> Vec<Value> {
        self.0.borrow_mut().drain(..).collect()
    }
}

impl TouchListener for Journal {
    fn on_begin_touch(&mut self, state: &mut GestureState, _x: f64, _y: f64) -> bool {
        self.record("begin", state, Value::Null);
        true
    }

    fn on_touch_move(&mut self, state: &mut GestureState) -> bool {
        self.record("move", state, json!({ "dx": state.move_x(), "dy": state.move_y() }));
        true
    }

    fn on_press(&mut self, state: &mut GestureState) {
        self.record("press", state, Value::Null);
    }

    fn on_click(&mut self, state: &mut GestureState) {
        self.record("click", state, Value::Null);
    }

    fn on_long_press(&mut self, state: &mut GestureState) -> bool {
        self.record("long_press", state, Value::Null);
        true
    }

    fn on_long_click(&mut self, state: &mut GestureState) {
        self.record("long_click", state, Value::Null);
    }

    fn on_double_click(&mut self, state: &mut GestureState) {
        self.record("double_click", state, Value::Null);
    }

    fn on_touch_end(&mut self, state: &mut GestureState) {
        self.record("end", state, Value::Null);
    }

    fn on_touch_cancel(&mut self, state: &mut GestureState) {
        self.record("cancel", state, Value::Null);
    }
}

impl ScaleListener for Journal {
    fn on_scale(&mut self, state: &mut GestureState) -> bool {
        self.record("scale", state, json!({ "factor": state.scale_factor() }));
        true
    }

    fn on_scale_end(&mut self, state: &mut GestureState) {
        self.record("scale_end", state, Value::Null);
    }
}

impl RotateListener for Journal {
    fn on_rotate(&mut self, state: &mut GestureState) -> bool {
        self.record("rotate", state, json!({ "degrees": state.rotation() }));
        true
    }

    fn on_rotate_end(&mut self, state: &mut GestureState) {
        self.record("rotate_end", state, Value::Null);
    }
}

impl MoveListener for Journal {
    fn on_move(&mut self, state: &mut GestureState) -> bool {
        self.record("multi_move", state, json!({ "dx": state.move_x(), "dy": state.move_y() }));
        true
    }

    fn on_move_end(&mut self, state: &mut GestureState) {
        self.record("multi_move_end", state, Value::Null);
    }
}

fn run_replay(cli: &Cli, text: &str) -> Result<(), CliError> {
    let script: ReplayScript = serde_json::from_str(text)?;
    let journal = Journal::default();
    let mut detector = GestureDetector::new(gesture_config(cli)?);
    detector.set_view_bounds(script.view);
    detector.set_touch_listener(journal.clone());
    detector.set_scale_listener(journal.clone());
    detector.set_rotate_listener(journal.clone());
    detector.set_move_listener(journal.clone());

    for (index, step) in script.steps.into_iter().enumerate() {
        let handled = match step {
            ReplayStep::Tick { tick } => detector.on_tick(tick),
            ReplayStep::Frame { action, contacts, time_ms } => {
                let snapshot = ContactSnapshot::new(action, contacts, time_ms)
                    .map_err(|source| CliError::Frame { index, source })?;
                match detector.try_on_touch_event(snapshot) {
                    Ok(handled) => handled,
                    Err(source) => {
                        tracing::warn!(index, error = %source, "frame rejected");
                        print_line(&json!({ "step": index, "event": "contract_violation", "error": source.to_string() }))?;
                        false
                    }
                }
            }
        };
        for mut line in journal.drain() {
            if let Some(map) = line.as_object_mut() {
                map.insert("step".to_owned(), json!(index));
            }
            print_line(&line)?;
        }
        tracing::debug!(index, handled, "step replayed");
    }
    Ok(())
}

// =============================================================
// Snap
// =============================================================

#[derive(Debug, Deserialize)]
struct SnapScript {
    body: MagneticBody,
    magnets: Vec<Magnet>,
    rects: HashMap<TargetId, Rect>,
    moves: Vec<Point>,
}

fn run_snap(cli: &Cli, text: &str) -> Result<(), CliError> {
    let script: SnapScript = serde_json::from_str(text)?;
    let target = script.body.target;
    let mut rects = script.rects;
    if !rects.contains_key(&target) {
        return Err(CliError::MissingBody(target));
    }
    let config = AdsorptionConfig { immunity_mode: cli.immunity_mode.into() };
    let mut engine = Adsorption::new(script.body, script.magnets, config);

    for (index, delta) in script.moves.into_iter().enumerate() {
        let outcome = engine.drag(delta, &rects);
        let Some(body) = rects.get_mut(&target) else {
            return Err(CliError::MissingBody(target));
        };
        *body = body.offset(outcome.delta.x, outcome.delta.y);
        print_line(&json!({
            "frame": index,
            "raw": delta,
            "delta": outcome.delta,
            "horizontal": outcome.horizontal,
            "vertical": outcome.vertical,
            "body": *body,
        }))?;
    }
    Ok(())
}

fn print_line(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string(value)?;
    println!("{rendered}");
    Ok(())
}
