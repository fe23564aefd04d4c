//! Headless replay of a two-peer inking session over the in-memory hub.
//!
//! Usage: `liveink-demo [config.json]`

use kurbo::{Point, Size};
use liveink_core::{
    InkResult, InkingConfig, InkingManager, InkingTool, Instant, MemoryChannel, MemoryHub,
    MemoryMap, PointerEvent, PointerPoint, SharedInkingSession, UserRole,
};
use liveink_render::{VelloSurface, VelloSurfaceHost};
use std::time::Duration;

type Session = SharedInkingSession<MemoryMap, MemoryChannel>;

const VIEWPORT: Size = Size::new(800.0, 600.0);
const FRAME: Duration = Duration::from_millis(16);

struct Peer {
    name: &'static str,
    session: Session,
    dry: VelloSurface,
    overlays: VelloSurfaceHost,
}

impl Peer {
    fn join(
        name: &'static str,
        hub: &MemoryHub,
        role: UserRole,
        config: &InkingConfig,
    ) -> InkResult<Self> {
        let dry = VelloSurface::new(VIEWPORT);
        let overlays = VelloSurfaceHost::new();
        let mut manager = InkingManager::builder()
            .dry_surface(Box::new(dry.clone()))
            .wet_host(Box::new(overlays.clone()))
            .viewport_size(VIEWPORT)
            .config(config.clone())
            .build()?;
        manager.activate();

        let session = SharedInkingSession::synchronize(
            manager,
            hub.map(),
            hub.channel(role),
            config.sync.clone(),
        );
        log::info!("{} joined as {:?}", name, role);
        Ok(Self { name, session, dry, overlays })
    }

    fn report(&self) {
        log::info!(
            "{}: {} strokes, {} dry fills, {} overlays, {} remote wet strokes",
            self.name,
            self.session.manager().stroke_count(),
            self.dry.fill_count(),
            self.overlays.len(),
            self.session.remote_wet_stroke_count(),
        );
    }
}

/// Ticks every peer twice per frame so broadcasts settle within the frame.
fn run_frames(peers: &mut [&mut Peer], clock: &mut Instant, frames: u32) {
    for _ in 0..frames {
        *clock += FRAME;
        for _ in 0..2 {
            for peer in peers.iter_mut() {
                peer.session.tick(*clock);
            }
        }
    }
}

/// Drag a pointer rightwards from `start`, one move per frame.
fn drag(peer: &mut Peer, other: &mut Peer, clock: &mut Instant, start: Point, steps: u32) {
    let at = |i: u32| {
        let x = start.x + 20.0 * f64::from(i);
        PointerEvent::new(1, PointerPoint::new(x, start.y, 0.5))
    };

    peer.session.manager_mut().pointer_down(&at(0));
    for i in 1..steps {
        peer.session.manager_mut().pointer_move(&at(i));
        run_frames(&mut [&mut *peer, &mut *other], clock, 1);
        if i == steps / 2 {
            other.report();
        }
    }
    peer.session.manager_mut().pointer_up(&at(steps));
    run_frames(&mut [&mut *peer, &mut *other], clock, 3);
}

fn run(config: InkingConfig) -> InkResult<()> {
    let hub = MemoryHub::new();
    let mut alice = Peer::join("alice", &hub, UserRole::Presenter, &config)?;
    let mut bob = Peer::join("bob", &hub, UserRole::Attendee, &config)?;
    let mut clock = Instant::now();

    drag(&mut alice, &mut bob, &mut clock, Point::new(200.0, 300.0), 10);
    alice.session.manager_mut().set_tool(InkingTool::Highlighter);
    drag(&mut alice, &mut bob, &mut clock, Point::new(200.0, 320.0), 6);
    alice.report();
    bob.report();

    // Bob rubs out the middle of the first line.
    bob.session.manager_mut().set_tool(InkingTool::PointEraser);
    drag(&mut bob, &mut alice, &mut clock, Point::new(300.0, 300.0), 2);
    alice.report();
    bob.report();

    let strokes: Vec<_> = alice.session.manager().strokes().collect();
    let document = serde_json::to_string_pretty(&strokes)?;
    println!("{document}");
    Ok(())
}

fn main() {
    env_logger::init();
    log::info!("Starting LiveInk demo");

    let config = match std::env::args().nth(1) {
        Some(path) => match InkingConfig::load(&path) {
            Ok(config) => config,
            Err(e) => {
                log::error!("Failed to load config {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => InkingConfig::default(),
    };

    if let Err(e) = run(config) {
        log::error!("Demo failed: {}", e);
        std::process::exit(1);
    }
}
