//! Headless driver for the whiteboard core.
//!
//! Each invocation loads a session file, replays one command through the
//! engine the way the browser host would (select, gesture, commit), writes the
//! session back and prints the result as JSON.


use std::io::Cursor;
use std::path::{Path, PathBuf};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use clap::{Parser, Subcommand, ValueEnum};
use image::ImageReader;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use serde_json::{Value, json};
use tracing_subscriber::EnvFilter;
use whiteboard::config::{ImageOptions, WhiteboardConfig};
use whiteboard::engine::{Action, EngineCore};
use whiteboard::error::{ErrorCode, ImageError, WhiteboardError};
use whiteboard::geometry::{BoundBox, Point};
use whiteboard::id::{ShapeId, ShapeKind};
use whiteboard::input::{Key, Modifiers, ToolMode};
use whiteboard::scene::{MemoryScene, SceneGraph};
use whiteboard::storage::MemoryStore;
use whiteboard::toolbar::ImageCompressor;
use whiteboard::zorder::ZOp;

type Board = EngineCore<MemoryScene, MemoryStore>;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("session file {path}: {source}")]
    Session { path: PathBuf, source: std::io::Error },
    #[error("image file {path}: {source}")]
    ImageFile { path: PathBuf, source: std::io::Error },
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("no shape with id `{0}`")]
    UnknownShape(String),
    #[error("{kind} shapes cannot be {verb}")]
    Unsupported { kind: ShapeKind, verb: &'static str },
    #[error("a stroke needs at least one point")]
    EmptyStroke,
    #[error("[{code}] {message}")]
    Board { code: &'static str, message: String },
}

impl From<WhiteboardError> for CliError {
    fn from(e: WhiteboardError) -> Self {
        Self::Board { code: e.error_code(), message: e.to_string() }
    }
}

#[derive(Parser, Debug)]
#[command(name = "whiteboard", about = "Drive a whiteboard session from the command line")]
struct Cli {
    /// JSON file holding the session store between runs.
    #[arg(long, env = "WHITEBOARD_SESSION", default_value = "whiteboard-session.json")]
    session: PathBuf,

    /// Toolbar color for created shapes and strokes.
    #[arg(long, global = true)]
    color: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every shape, bottom to top.
    Show,
    /// Add a shape at its default spot.
    Add { kind: KindArg },
    /// Draw a freehand stroke through `x,y` points.
    Draw {
        #[arg(required = true, value_parser = parse_point)]
        points: Vec<Point>,
    },
    /// Drag a shape so its origin lands on `x,y`.
    Move {
        id: String,
        #[arg(value_parser = parse_point)]
        to: Point,
    },
    /// Resize a shape through the transform handle.
    Resize { id: String, width: f64, height: f64 },
    /// Replace a text shape's content.
    Text { id: String, content: String },
    /// Recolor a shape.
    Recolor { id: String, color: String },
    /// Move a shape up the stack.
    Raise {
        id: String,
        /// Go all the way to the top.
        #[arg(long)]
        top: bool,
    },
    /// Move a shape down the stack.
    Lower {
        id: String,
        /// Go all the way to the bottom.
        #[arg(long)]
        bottom: bool,
    },
    /// Delete a shape.
    Delete { id: String },
    /// Compress an image file and add it to the board.
    Image { path: PathBuf },
    /// Remove every shape and the stored session.
    Clear,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum KindArg {
    Rect,
    Circle,
    Line,
    Arrow,
    Text,
}

impl From<KindArg> for ShapeKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Rect => ShapeKind::Rectangle,
            KindArg::Circle => ShapeKind::Circle,
            KindArg::Line => ShapeKind::Line,
            KindArg::Arrow => ShapeKind::Arrow,
            KindArg::Text => ShapeKind::Text,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let store = read_session(&cli.session).await?;
    let mut board = EngineCore::headless(WhiteboardConfig::from_env(), store);
    board.load();
    if let Some(color) = &cli.color {
        board.set_color(color);
    }

    let actions = run(&mut board, cli.command).await?;
    report_persist_failures(&actions)?;

    write_session(&cli.session, board.store()).await?;
    print_json(&board_json(&board)?)
}

async fn run(board: &mut Board, command: Command) -> Result<Vec<Action>, CliError> {
    let actions = match command {
        Command::Show => Vec::new(),
        Command::Add { kind } => board.create_shape(kind.into()),
        Command::Draw { points } => draw(board, &points)?,
        Command::Move { id, to } => {
            let id = known(board, &id)?;
            board.scene_mut().drag_to(&id, to);
            board.on_drag_end(&id)
        }
        Command::Resize { id, width, height } => {
            let id = known(board, &id)?;
            resize(board, &id, width, height)
        }
        Command::Text { id, content } => {
            let id = known(board, &id)?;
            let mut actions = board.edit_text(&id);
            if actions.is_empty() {
                return Err(unsupported(&id, "edited as text"));
            }
            board.text_input(&content);
            actions.extend(board.on_key_down(&Key::new("Enter"), Modifiers::default()));
            actions
        }
        Command::Recolor { id, color } => {
            let id = known(board, &id)?;
            board.select_shape(&id);
            let actions = board.set_selected_color(&color);
            if actions.is_empty() {
                return Err(unsupported(&id, "recolored"));
            }
            actions
        }
        Command::Raise { id, top } => restack(board, &id, if top { ZOp::BringToFront } else { ZOp::BringForward })?,
        Command::Lower { id, bottom } => restack(board, &id, if bottom { ZOp::SendToBack } else { ZOp::SendBackward })?,
        Command::Delete { id } => {
            let id = known(board, &id)?;
            board.select_shape(&id);
            board.on_key_down(&Key::new("Delete"), Modifiers::default())
        }
        Command::Image { path } => {
            let bytes =
                tokio::fs::read(&path).await.map_err(|source| CliError::ImageFile { path: path.clone(), source })?;
            board.create_image(&JpegCompressor, &bytes).await?
        }
        Command::Clear => board.clear_board()?,
    };
    Ok(actions)
}

fn draw(board: &mut Board, points: &[Point]) -> Result<Vec<Action>, CliError> {
    let (first, rest) = points.split_first().ok_or(CliError::EmptyStroke)?;
    board.set_tool(ToolMode::Brush);
    board.on_pointer_down(*first);
    for pt in rest {
        board.on_pointer_move(*pt);
    }
    let last = rest.last().unwrap_or(first);
    let actions = board.on_pointer_up(*last);
    board.set_tool(ToolMode::Default);
    Ok(actions)
}

fn resize(board: &mut Board, id: &ShapeId, width: f64, height: f64) -> Vec<Action> {
    let mut actions = board.select_shape(id);
    let Some(current) = board.scene().node(id).map(whiteboard::scene::SceneNode::bounds) else {
        return actions;
    };
    let accepted = board.scene_mut().resize_to(BoundBox { width, height, ..current });
    tracing::debug!(%id, ?accepted, "handle accepted box");
    actions.extend(board.on_transform_end(id));
    actions
}

fn restack(board: &mut Board, id: &str, op: ZOp) -> Result<Vec<Action>, CliError> {
    let id = known(board, id)?;
    board.select_shape(&id);
    Ok(board.reorder(op))
}

fn known(board: &Board, raw: &str) -> Result<ShapeId, CliError> {
    let id = ShapeId::from_raw(raw);
    if board.registry().contains(&id) { Ok(id) } else { Err(CliError::UnknownShape(raw.to_owned())) }
}

fn unsupported(id: &ShapeId, verb: &'static str) -> CliError {
    match id.kind() {
        Some(kind) => CliError::Unsupported { kind, verb },
        None => CliError::UnknownShape(id.to_string()),
    }
}

fn report_persist_failures(actions: &[Action]) -> Result<(), CliError> {
    match actions.iter().find(|a| matches!(a, Action::PersistFailed { .. })) {
        Some(Action::PersistFailed { code, message }) => Err(CliError::Board { code: *code, message: message.clone() }),
        _ => Ok(()),
    }
}

fn board_json(board: &Board) -> Result<Value, CliError> {
    let shapes = board
        .scene()
        .shape_order()
        .iter()
        .filter_map(|id| board.registry().find(id))
        .map(|shape| serde_json::to_value(&shape))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(json!({ "shapes": shapes, "count": board.registry().len() }))
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}

/// Parse `x,y` into a point.
fn parse_point(raw: &str) -> Result<Point, String> {
    let (x, y) = raw.split_once(',').ok_or_else(|| format!("expected x,y, got `{raw}`"))?;
    let x: f64 = x.trim().parse().map_err(|e| format!("bad x in `{raw}`: {e}"))?;
    let y: f64 = y.trim().parse().map_err(|e| format!("bad y in `{raw}`: {e}"))?;
    Ok(Point::new(x, y))
}

// =============================================================================
// SESSION FILE
// =============================================================================

async fn read_session(path: &Path) -> Result<MemoryStore, CliError> {
    match tokio::fs::read_to_string(path).await {
        Ok(raw) => Ok(serde_json::from_str(&raw)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(MemoryStore::new()),
        Err(source) => Err(CliError::Session { path: path.to_owned(), source }),
    }
}

async fn write_session(path: &Path, store: &MemoryStore) -> Result<(), CliError> {
    let raw = serde_json::to_string_pretty(store)?;
    tokio::fs::write(path, raw).await.map_err(|source| CliError::Session { path: path.to_owned(), source })
}

// =============================================================================
// IMAGE COMPRESSION
// =============================================================================

/// Downscales to the configured longest edge and re-encodes as JPEG.
struct JpegCompressor;

#[async_trait::async_trait(?Send)]
impl ImageCompressor for JpegCompressor {
    async fn compress(&self, bytes: &[u8], options: &ImageOptions) -> Result<String, ImageError> {
        let decoded = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| ImageError::Source(e.to_string()))?
            .decode()
            .map_err(|e| ImageError::Decode(e.to_string()))?;

        let edge = options.max_dimension;
        let scaled = if decoded.width() > edge || decoded.height() > edge {
            decoded.resize(edge, edge, FilterType::Triangle)
        } else {
            decoded
        };

        let mut jpeg = Vec::new();
        JpegEncoder::new_with_quality(&mut jpeg, jpeg_quality(options.quality))
            .encode_image(&scaled.to_rgb8())
            .map_err(|e| ImageError::Encode(e.to_string()))?;
        Ok(format!("data:image/jpeg;base64,{}", STANDARD.encode(&jpeg)))
    }
}

/// Map a `(0, 1]` quality onto the encoder's 1..=100 scale.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn jpeg_quality(quality: f64) -> u8 {
    (quality * 100.0).round().clamp(1.0, 100.0) as u8
}
