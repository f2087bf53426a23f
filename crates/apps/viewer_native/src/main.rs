use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use clap::Parser;
use engine::input::PointerButton;
use engine::texture::FileTextureLoader;
use engine::{ContainerRect, Engine, EngineConfig, EngineEvent, FrameStatus, Viewport};
use foundation::geo::GeoPoint;
use foundation::math::Vec2;
use foundation::math::projection::ProjectionMode;
use foundation::time::Time;
use gpu::{GraphicsBackend, HeadlessBackend};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Drives the globe/map view without a window and prints selected coordinates")]
struct Args {
    /// Engine config (JSON); missing fields keep their defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Stops as a JSON array of {"name","lat","lng"}
    #[arg(long)]
    stops: Option<PathBuf>,

    /// Projection to start in (globe or map)
    #[arg(long, value_parser = parse_mode)]
    mode: Option<ProjectionMode>,

    /// Surface texture identifier, resolved under the texture root
    #[arg(long)]
    texture: Option<String>,

    /// Directory holding surface textures
    #[arg(long)]
    texture_root: Option<PathBuf>,

    #[arg(long, default_value_t = 800)]
    width: u32,

    #[arg(long, default_value_t = 600)]
    height: u32,

    /// Number of frames to run
    #[arg(long, default_value_t = 120)]
    frames: u32,

    /// Wall-clock pause between frames, lets texture loads land
    #[arg(long, default_value_t = 16)]
    frame_ms: u64,

    /// Click at x,y (client pixels) after the first frame; repeatable
    #[arg(long, value_parser = parse_point)]
    click: Vec<(f64, f64)>,

    /// Drag from x0,y0 to x1,y1 after the first frame, optionally with a
    /// DOM button index (0 primary, 1 middle, 2 secondary); repeatable
    #[arg(long, value_name = "X0,Y0:X1,Y1[:BUTTON]", value_parser = parse_drag)]
    drag: Vec<DragScript>,

    /// Switch projection after this many frames
    #[arg(long)]
    toggle_at: Option<u32>,

    /// Disable auto-rotate
    #[arg(long)]
    no_auto_rotate: bool,

    /// Render offscreen through wgpu instead of the resource ledger
    /// (needs the `wgpu` feature)
    #[arg(long)]
    gpu: bool,
}

fn parse_point(s: &str) -> Result<(f64, f64), String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected x,y, got {s:?}"))?;
    let x = x.trim().parse::<f64>().map_err(|e| format!("bad x in {s:?}: {e}"))?;
    let y = y.trim().parse::<f64>().map_err(|e| format!("bad y in {s:?}: {e}"))?;
    Ok((x, y))
}

/// Same names as the config file's `initial_mode`.
fn parse_mode(s: &str) -> Result<ProjectionMode, String> {
    serde_json::from_value(serde_json::Value::String(s.to_ascii_lowercase()))
        .map_err(|_| format!("unknown projection {s:?} (expected globe or map)"))
}

#[derive(Debug, Copy, Clone, PartialEq)]
struct DragScript {
    from: Vec2,
    to: Vec2,
    button: PointerButton,
}

/// Pointer moves between the ends of a scripted drag.
const DRAG_STEPS: u32 = 8;
/// Press duration of a scripted drag.
const DRAG_MS: f64 = 300.0;

fn parse_drag(s: &str) -> Result<DragScript, String> {
    let mut parts = s.split(':');
    let (Some(from), Some(to)) = (parts.next(), parts.next()) else {
        return Err(format!("expected x0,y0:x1,y1[:button], got {s:?}"));
    };
    let button = match parts.next() {
        Some(b) => {
            let index = b.trim().parse::<i32>().map_err(|e| format!("bad button in {s:?}: {e}"))?;
            PointerButton::from_index(index)
        }
        None => PointerButton::Primary,
    };
    if parts.next().is_some() {
        return Err(format!("expected x0,y0:x1,y1[:button], got {s:?}"));
    }
    let (x0, y0) = parse_point(from)?;
    let (x1, y1) = parse_point(to)?;
    Ok(DragScript {
        from: Vec2::new(x0, y0),
        to: Vec2::new(x1, y1),
        button,
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => EngineConfig::from_path(path)?,
        None => EngineConfig::default(),
    };
    if let Some(mode) = args.mode {
        config.initial_mode = mode;
    }
    if let Some(texture) = &args.texture {
        config.textures.default_texture = texture.clone();
    }
    if let Some(root) = &args.texture_root {
        config.textures.root = root.display().to_string();
    }
    if args.no_auto_rotate {
        config.camera.globe_auto_rotate = false;
    }

    let stops: Vec<GeoPoint> = match &args.stops {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => Vec::new(),
    };

    let loader = FileTextureLoader::new(&config.textures.root);

    if args.gpu {
        #[cfg(feature = "wgpu")]
        {
            let backend = gpu::WgpuBackend::new(args.width, args.height)?;
            return run(Engine::new(config, backend, loader), &args, &stops);
        }
        #[cfg(not(feature = "wgpu"))]
        return Err("--gpu needs a build with the wgpu feature".into());
    }

    let backend = HeadlessBackend::new(args.width, args.height);
    run(Engine::new(config, backend, loader), &args, &stops)
}

fn run<B: GraphicsBackend>(
    mut engine: Engine<B, FileTextureLoader>,
    args: &Args,
    stops: &[GeoPoint],
) -> Result<(), Box<dyn std::error::Error>> {
    let viewport = Viewport::new(args.width, args.height);
    let rect = ContainerRect::from_viewport(viewport);
    engine.initialize(viewport)?;
    engine.set_stops(stops)?;

    let mut drawn = 0u32;
    for i in 0..args.frames {
        let now_s = i as f64 / 60.0;
        match engine.frame(now_s) {
            FrameStatus::Drawn(_) => drawn += 1,
            FrameStatus::Skipped => {}
            FrameStatus::Stopped => break,
        }

        if i == 0 {
            let now_ms = Time(now_s).as_millis();
            for (x, y) in &args.click {
                engine.pointer_down(*x, *y, now_ms, PointerButton::Primary);
                if engine.pointer_up(*x, *y, now_ms + 50.0, &rect).is_none() {
                    warn!(x, y, "click missed the surface");
                }
            }
            for drag in &args.drag {
                run_drag(&mut engine, drag, now_ms, &rect);
            }
        }
        if args.toggle_at == Some(i) {
            engine.toggle_mode()?;
        }

        for event in engine.drain_events() {
            let EngineEvent::CoordinateSelected(geo) = event.payload;
            println!("{}", serde_json::to_string(&geo)?);
        }

        if args.frame_ms > 0 {
            thread::sleep(Duration::from_millis(args.frame_ms));
        }
    }

    info!(
        frames = drawn,
        mode = ?engine.mode(),
        live_resources = engine.backend().live_resources(),
        metrics = ?engine.metrics().snapshot(),
        "run finished"
    );
    engine.teardown();
    Ok(())
}

fn run_drag<B: GraphicsBackend>(
    engine: &mut Engine<B, FileTextureLoader>,
    drag: &DragScript,
    start_ms: f64,
    rect: &ContainerRect,
) {
    engine.pointer_down(drag.from.x, drag.from.y, start_ms, drag.button);
    for step in 1..=DRAG_STEPS {
        let t = step as f64 / DRAG_STEPS as f64;
        let p = drag.from + (drag.to - drag.from) * t;
        engine.pointer_move(p.x, p.y);
    }
    // A drag too short to leave the click radius still resolves as a click.
    if let Some(geo) = engine.pointer_up(drag.to.x, drag.to.y, start_ms + DRAG_MS, rect) {
        info!(lat = geo.lat, lng = geo.lng, "drag released as a click");
    }
}

#[cfg(test)]
mod tests {
    use super::{DragScript, parse_drag, parse_mode, parse_point, run_drag};
    use engine::input::PointerButton;
    use engine::texture::FileTextureLoader;
    use engine::{ContainerRect, Engine, EngineConfig, Viewport};
    use foundation::math::Vec2;
    use gpu::HeadlessBackend;
    use foundation::math::projection::ProjectionMode;

    #[test]
    fn parses_click_points() {
        assert_eq!(parse_point("400,300"), Ok((400.0, 300.0)));
        assert_eq!(parse_point(" 1.5 , -2 "), Ok((1.5, -2.0)));
        assert!(parse_point("400").is_err());
        assert!(parse_point("a,1").is_err());
    }

    #[test]
    fn parses_modes() {
        assert_eq!(parse_mode("Map"), Ok(ProjectionMode::Map));
        assert_eq!(parse_mode("globe"), Ok(ProjectionMode::Globe));
        assert!(parse_mode("mercator").is_err());
    }

    #[test]
    fn parses_drag_scripts() {
        assert_eq!(
            parse_drag("10,20:110,20"),
            Ok(DragScript {
                from: Vec2::new(10.0, 20.0),
                to: Vec2::new(110.0, 20.0),
                button: PointerButton::Primary,
            })
        );
        assert_eq!(parse_drag("0,0:5,5:2").map(|d| d.button), Ok(PointerButton::Secondary));
        assert_eq!(parse_drag("0,0:5,5:1").map(|d| d.button), Ok(PointerButton::Middle));
        assert!(parse_drag("0,0").is_err());
        assert!(parse_drag("0,0:1,1:x").is_err());
        assert!(parse_drag("0,0:1,1:0:9").is_err());
    }

    #[test]
    fn scripted_drag_moves_camera_without_selecting() {
        let mut config = EngineConfig::default();
        config.camera.globe_auto_rotate = false;
        config.stars.count = 16;
        let viewport = Viewport::new(800, 600);
        let rect = ContainerRect::from_viewport(viewport);
        let mut engine = Engine::new(config, HeadlessBackend::new(800, 600), FileTextureLoader::new("missing"));
        engine.initialize(viewport).unwrap();
        engine.frame(0.0);
        let before = engine.scene().unwrap().camera.position;

        let drag = parse_drag("400,300:500,300").unwrap();
        run_drag(&mut engine, &drag, 0.0, &rect);
        for i in 1..30 {
            engine.frame(i as f64 / 60.0);
        }

        assert_eq!(engine.metrics().counter("gesture.drags"), 1);
        assert_eq!(engine.metrics().counter("pick.attempts"), 0);
        assert!(engine.drain_events().is_empty());
        assert!((engine.scene().unwrap().camera.position - before).length() > 1e-3);
    }
}
