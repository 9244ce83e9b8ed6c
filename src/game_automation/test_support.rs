// Scripted fake emulator window for the state-loop scenario tests
use super::config::BotConfig;
use super::control::ControlPlane;
use super::match_image::{Detector, TemplateLibrary, Token};
use super::session::Session;
use crate::host::{HostError, HostPlatform, HostResult, WindowInfo, WindowRect};
use crate::template_matching::Point;
use image::{GrayImage, Luma, Rgb, RgbImage};
use rand::{Rng, SeedableRng, rngs::StdRng};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::time::Instant;

pub const WINDOW: WindowRect = WindowRect::new(100, 50, 160, 120);
pub const TEMPLATE_SIZE: u32 = 10;
const BACKGROUND: u8 = 128;

/// Deterministic noise patch standing in for a token's reference image
pub fn noise_template(token: Token) -> GrayImage {
    let mut rng = StdRng::seed_from_u64(0x70_3e_00 + token as u64);
    GrayImage::from_fn(TEMPLATE_SIZE, TEMPLATE_SIZE, |_, _| Luma([rng.r#gen::<u8>()]))
}

pub fn library_without(excluded: &[Token]) -> TemplateLibrary {
    TemplateLibrary::from_images(
        Token::ALL
            .into_iter()
            .filter(|t| !excluded.contains(t))
            .map(|t| (t, noise_template(t))),
    )
}

/// Screen coordinates of a frame-local point in the fake window
pub fn screen(x: u32, y: u32) -> (i32, i32) {
    WINDOW.to_screen(Point::new(x, y))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placed {
    pub token: Token,
    /// Centre in frame coordinates, the point a matcher reports
    pub center: Point,
}

impl Placed {
    fn top_left(&self) -> (u32, u32) {
        let half = TEMPLATE_SIZE / 2;
        (self.center.x - half, self.center.y - half)
    }

    fn contains(&self, x: i32, y: i32) -> bool {
        let (left, top) = self.top_left();
        let (left, top) = (left as i32, top as i32);
        let size = TEMPLATE_SIZE as i32;
        (left..left + size).contains(&x) && (top..top + size).contains(&y)
    }
}

#[derive(Debug, Default)]
pub struct Scene {
    pub items: Vec<Placed>,
}

impl Scene {
    pub fn place(&mut self, token: Token, x: u32, y: u32) {
        self.items.push(Placed {
            token,
            center: Point::new(x, y),
        });
    }

    pub fn remove(&mut self, token: Token) {
        self.items.retain(|p| p.token != token);
    }

    pub fn has(&self, token: Token) -> bool {
        self.items.iter().any(|p| p.token == token)
    }

    /// Topmost item under a frame-local point
    fn hit(&self, x: i32, y: i32) -> Option<Placed> {
        self.items.iter().rev().find(|p| p.contains(x, y)).copied()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Click {
    pub index: usize,
    pub x: i32,
    pub y: i32,
    pub at: Instant,
    pub hit: Option<Token>,
}

impl Click {
    pub fn pos(&self) -> (i32, i32) {
        (self.x, self.y)
    }
}

type Reaction = Box<dyn FnMut(&mut Scene, &Click) + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WindowMode {
    Present,
    Missing,
    Broken,
}

pub struct FakeHost {
    templates: HashMap<Token, GrayImage>,
    scene: Mutex<Scene>,
    clicks: Mutex<Vec<Click>>,
    captures: Mutex<usize>,
    reaction: Mutex<Option<Reaction>>,
    mode: WindowMode,
}

impl FakeHost {
    pub fn new() -> Self {
        Self::with_mode(WindowMode::Present)
    }

    /// No emulator window is open
    pub fn without_window() -> Self {
        Self::with_mode(WindowMode::Missing)
    }

    /// Window enumeration itself fails
    pub fn broken() -> Self {
        Self::with_mode(WindowMode::Broken)
    }

    fn with_mode(mode: WindowMode) -> Self {
        Self {
            templates: Token::ALL
                .into_iter()
                .map(|t| (t, noise_template(t)))
                .collect(),
            scene: Mutex::new(Scene::default()),
            clicks: Mutex::new(Vec::new()),
            captures: Mutex::new(0),
            reaction: Mutex::new(None),
            mode,
        }
    }

    pub fn place(&self, token: Token, x: u32, y: u32) {
        self.scene.lock().unwrap().place(token, x, y);
    }

    pub fn has(&self, token: Token) -> bool {
        self.scene.lock().unwrap().has(token)
    }

    /// Scene update applied after every click
    pub fn on_click(&self, reaction: impl FnMut(&mut Scene, &Click) + Send + 'static) {
        *self.reaction.lock().unwrap() = Some(Box::new(reaction));
    }

    pub fn clicks(&self) -> Vec<Click> {
        self.clicks.lock().unwrap().clone()
    }

    pub fn click_positions(&self) -> Vec<(i32, i32)> {
        self.clicks().iter().map(Click::pos).collect()
    }

    pub fn clicks_on(&self, token: Token) -> usize {
        self.clicks().iter().filter(|c| c.hit == Some(token)).count()
    }

    pub fn captures(&self) -> usize {
        *self.captures.lock().unwrap()
    }
}

impl HostPlatform for FakeHost {
    fn name(&self) -> &str {
        "fake"
    }

    fn windows(&self) -> HostResult<Vec<WindowInfo>> {
        match self.mode {
            WindowMode::Present => Ok(vec![WindowInfo {
                id: 1,
                title: "MuMu Player 12".to_string(),
                rect: WINDOW,
            }]),
            WindowMode::Missing => Ok(vec![WindowInfo {
                id: 2,
                title: "Terminal".to_string(),
                rect: WindowRect::new(0, 0, 640, 480),
            }]),
            WindowMode::Broken => Err(HostError::EnumerationFailed {
                description: "display server unavailable".to_string(),
            }),
        }
    }

    fn restore(&self, _window: &WindowInfo) -> HostResult<()> {
        Ok(())
    }

    fn grab(&self, rect: WindowRect) -> HostResult<RgbImage> {
        *self.captures.lock().unwrap() += 1;
        let mut frame = RgbImage::from_pixel(
            rect.width as u32,
            rect.height as u32,
            Rgb([BACKGROUND; 3]),
        );
        for item in &self.scene.lock().unwrap().items {
            let (left, top) = item.top_left();
            for (x, y, p) in self.templates[&item.token].enumerate_pixels() {
                frame.put_pixel(left + x, top + y, Rgb([p[0]; 3]));
            }
        }
        Ok(frame)
    }

    fn click(&self, x: i32, y: i32) {
        let mut scene = self.scene.lock().unwrap();
        let mut clicks = self.clicks.lock().unwrap();
        let click = Click {
            index: clicks.len(),
            x,
            y,
            at: Instant::now(),
            hit: scene.hit(x - WINDOW.left, y - WINDOW.top).map(|p| p.token),
        };
        clicks.push(click);
        drop(clicks);
        if let Some(reaction) = self.reaction.lock().unwrap().as_mut() {
            reaction(&mut scene, &click);
        }
    }
}

/// Defaults with the bubble column moved inside the small fake window
pub fn test_config() -> BotConfig {
    let mut config = BotConfig::default();
    config.layout.bubble_x_offset = 150;
    config
}

pub fn session_with(
    host: Arc<FakeHost>,
    config: BotConfig,
    library: TemplateLibrary,
) -> Session<FakeHost> {
    let detector = Detector::new(library, config.matching.clone());
    Session::new(host, detector, config, ControlPlane::new())
}

pub fn session(host: Arc<FakeHost>) -> Session<FakeHost> {
    session_with(host, test_config(), library_without(&[]))
}
