//! main.rs - Desktop host for the particle background
//! Owns the window, the frame pacing and every input; the library owns the animation

use std::fs;
use std::io;
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context;
use embedded_graphics::{
    mono_font::{
        ascii::{FONT_10X20, FONT_6X10},
        MonoTextStyle,
    },
    pixelcolor::Rgb565,
    prelude::*,
    primitives::{Circle, Line, PrimitiveStyle, Rectangle},
    text::{Baseline, Text},
};
use embedded_graphics_simulator::{OutputSettingsBuilder, SimulatorDisplay, SimulatorEvent, Window};
use log::{error, info};

use particle_field::{
    theme::PREFERENCE_LEN, CardRect, CardTilt, Dimensions as Extent, LoopState, ParticleBackground,
    PreferenceStore, Reschedule, Scheduler, Settings, SplashScreen, StopSignal, Surface, Theme, ThemeManager,
    Tilt, TypingTitle,
};

const MAX_PARTICLES: usize = 64;

// Viewport sizes cycled by the R key, all within the window
const VIEWPORT_PRESETS: [(f32, f32); 4] = [(640.0, 360.0), (480.0, 270.0), (320.0, 180.0), (200.0, 200.0)];

const LETTERBOX: Rgb565 = Rgb565::new(1, 2, 1);

// Rows below the largest viewport reserved for the status line
const STATUS_BAR_HEIGHT: u32 = 12;

const CARD_SIZE: (f32, f32) = (220.0, 64.0);

// Pixels of outline skew per degree of tilt
const TILT_SKEW: f32 = 1.0;

fn display_size() -> Size {
    let (w, h) = VIEWPORT_PRESETS[0];
    Size::new(w as u32, h as u32 + STATUS_BAR_HEIGHT)
}

fn backdrop(theme: Theme) -> Rgb565 {
    match theme {
        Theme::Dark => Rgb565::new(2, 4, 6),
        Theme::Light => Rgb565::new(18, 38, 24),
    }
}

fn text_color(theme: Theme) -> Rgb565 {
    match theme {
        Theme::Dark => Rgb565::new(28, 58, 31),
        Theme::Light => Rgb565::new(4, 8, 10),
    }
}

// `fg` composited over `bg` at `alpha`
fn blend(bg: Rgb565, fg: Rgb565, alpha: f32) -> Rgb565 {
    let a = alpha.clamp(0.0, 1.0);
    let mix = |b: u8, f: u8| (b as f32 + (f as f32 - b as f32) * a).round() as u8;
    Rgb565::new(mix(bg.r(), fg.r()), mix(bg.g(), fg.g()), mix(bg.b(), fg.b()))
}

fn blend_white(bg: Rgb565, alpha: f32) -> Rgb565 {
    blend(bg, Rgb565::WHITE, alpha)
}

fn card_for(viewport: Extent) -> CardRect {
    let (w, h) = CARD_SIZE;
    CardRect {
        x: (viewport.width - w) / 2.0,
        y: (viewport.height - h) / 2.0,
        width: w,
        height: h,
    }
}

// Outline of a tilted card: TL, TR, BR, BL
fn card_corners(card: &CardRect, tilt: Tilt) -> [Point; 4] {
    let cx = card.x + card.width / 2.0;
    let cy = card.y + card.height / 2.0;
    let hw = card.width / 2.0 * tilt.scale;
    let hh = card.height / 2.0 * tilt.scale;

    let top_hw = hw + tilt.rotate_x * TILT_SKEW;
    let bottom_hw = hw - tilt.rotate_x * TILT_SKEW;
    let left_hh = hh - tilt.rotate_y * TILT_SKEW;
    let right_hh = hh + tilt.rotate_y * TILT_SKEW;

    let p = |x: f32, y: f32| Point::new(x.round() as i32, y.round() as i32);
    [
        p(cx - top_hw, cy - left_hh),
        p(cx + top_hw, cy - right_hh),
        p(cx + bottom_hw, cy + right_hh),
        p(cx - bottom_hw, cy + left_hh),
    ]
}

/// Draws the field into the viewport part of the simulator display.
struct SimulatorSurface<'d> {
    display: &'d mut SimulatorDisplay<Rgb565>,
    backdrop: Rgb565,
    viewport: Rectangle,
}

impl<'d> SimulatorSurface<'d> {
    fn new(display: &'d mut SimulatorDisplay<Rgb565>, theme: Theme) -> Self {
        let viewport = display.bounding_box();
        Self {
            display,
            backdrop: backdrop(theme),
            viewport,
        }
    }
}

impl Surface for SimulatorSurface<'_> {
    type Error = <SimulatorDisplay<Rgb565> as DrawTarget>::Error;

    fn clear(&mut self, bounds: Extent) -> Result<(), Self::Error> {
        self.display.clear(LETTERBOX)?;
        self.viewport = Rectangle::new(
            Point::zero(),
            Size::new(bounds.width.max(0.0) as u32, bounds.height.max(0.0) as u32),
        );
        self.viewport
            .into_styled(PrimitiveStyle::with_fill(self.backdrop))
            .draw(&mut *self.display)
    }

    fn fill_disc(&mut self, x: f32, y: f32, radius: f32, opacity: f32) -> Result<(), Self::Error> {
        let color = blend_white(self.backdrop, opacity);
        let diameter = (radius * 2.0).round().max(1.0) as u32;
        Circle::with_center(Point::new(x.round() as i32, y.round() as i32), diameter)
            .into_styled(PrimitiveStyle::with_fill(color))
            .draw(&mut self.display.clipped(&self.viewport))
    }

    fn stroke_line(
        &mut self,
        from: (f32, f32),
        to: (f32, f32),
        opacity: f32,
        width: f32,
    ) -> Result<(), Self::Error> {
        let color = blend_white(self.backdrop, opacity);
        Line::new(
            Point::new(from.0.round() as i32, from.1.round() as i32),
            Point::new(to.0.round() as i32, to.1.round() as i32),
        )
        .into_styled(PrimitiveStyle::with_stroke(color, width.round().max(1.0) as u32))
        .draw(&mut self.display.clipped(&self.viewport))
    }
}

/// One file per key inside a state directory.
struct FilePreferences {
    dir: PathBuf,
}

impl FilePreferences {
    fn open(dir: PathBuf) -> io::Result<Self> {
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }
}

impl PreferenceStore for FilePreferences {
    type Error = io::Error;

    fn get(&mut self, key: &str) -> io::Result<Option<heapless::String<PREFERENCE_LEN>>> {
        let raw = match fs::read_to_string(self.dir.join(key)) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };
        raw.trim()
            .parse()
            .map(Some)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, format!("{key} value too long")))
    }

    fn set(&mut self, key: &str, value: &str) -> io::Result<()> {
        fs::write(self.dir.join(key), value)
    }
}

fn draw_splash(
    display: &mut SimulatorDisplay<Rgb565>,
    splash: &SplashScreen,
    theme: Theme,
    viewport: Extent,
) -> anyhow::Result<()> {
    let color = blend(backdrop(theme), text_color(theme), splash.splash_opacity());
    let cx = (viewport.width / 2.0) as i32;
    let cy = (viewport.height / 2.0) as i32;
    let big = MonoTextStyle::new(&FONT_10X20, color);
    let small = MonoTextStyle::new(&FONT_6X10, color);
    // the pair draws together as it shrinks away
    let gap = (20.0 * splash.splash_scale()).round() as i32;
    let name = TypingTitle::DEFAULT_TEXT;
    Text::with_baseline(name, Point::new(cx - name.len() as i32 * 5, cy - gap), big, Baseline::Top).draw(display)?;
    let hint = "press Enter";
    Text::with_baseline(hint, Point::new(cx - hint.len() as i32 * 3, cy + gap / 3), small, Baseline::Top)
        .draw(display)?;
    Ok(())
}

// Title inside its tilting card, faded and slid in by the splash entrance
fn draw_content(
    display: &mut SimulatorDisplay<Rgb565>,
    title: &str,
    card: &CardTilt,
    splash: &SplashScreen,
    theme: Theme,
    viewport: Extent,
) -> anyhow::Result<()> {
    let color = blend(backdrop(theme), text_color(theme), splash.content_opacity());
    let offset = splash.content_offset().round() as i32;
    let area = Rectangle::new(Point::zero(), Size::new(viewport.width as u32, viewport.height as u32));
    let mut display = display.clipped(&area);

    let corners = card_corners(&card.card(), card.tilt()).map(|c| c + Point::new(0, offset));
    let outline = PrimitiveStyle::with_stroke(color, 1);
    for i in 0..corners.len() {
        Line::new(corners[i], corners[(i + 1) % corners.len()])
            .into_styled(outline)
            .draw(&mut display)?;
    }

    let rect = card.card();
    let style = MonoTextStyle::new(&FONT_10X20, color);
    let x = (rect.x + rect.width / 2.0) as i32 - (title.len() as i32 * 10) / 2;
    let y = (rect.y + rect.height / 2.0) as i32 - 10 + offset;
    Text::with_baseline(title, Point::new(x, y), style, Baseline::Top).draw(&mut display)?;
    Ok(())
}

fn draw_status(
    display: &mut SimulatorDisplay<Rgb565>,
    theme: Theme,
    viewport: Extent,
    scheduler: &Scheduler<'_>,
) -> anyhow::Result<()> {
    let height = display.bounding_box().size.height as i32;
    let width = display.bounding_box().size.width;
    let top = height - STATUS_BAR_HEIGHT as i32;
    Rectangle::new(Point::new(0, top), Size::new(width, STATUS_BAR_HEIGHT))
        .into_styled(PrimitiveStyle::with_fill(LETTERBOX))
        .draw(display)?;

    let state = match scheduler.state() {
        LoopState::Idle => "idle",
        LoopState::Running => "running",
        LoopState::Stopped => "stopped",
    };
    let status = format!(
        "[{}] {}x{} | {} | frame {} | T: Theme  R: Resize  S: Stop  Q: Quit",
        theme.icon(),
        viewport.width,
        viewport.height,
        state,
        scheduler.frames(),
    );
    let style = MonoTextStyle::new(&FONT_6X10, Rgb565::new(12, 28, 16));
    Text::with_baseline(&status, Point::new(4, top + 1), style, Baseline::Top).draw(display)?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let settings = Settings::default();

    let state_dir = std::env::var_os("PARTICLE_FIELD_STATE_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    let store = FilePreferences::open(state_dir.clone())
        .with_context(|| format!("creating preference directory {}", state_dir.display()))?;
    let mut themes = ThemeManager::load(store);

    let (max_w, max_h) = VIEWPORT_PRESETS[0];
    let mut display = SimulatorDisplay::<Rgb565>::new(display_size());
    let output_settings = OutputSettingsBuilder::new().scale(2).build();
    let mut window = Window::new("Particle Field", &output_settings);

    let mut background: ParticleBackground<MAX_PARTICLES> = ParticleBackground::new(Settings {
        surface_width: max_w,
        surface_height: max_h,
        ..settings
    });
    let mut title = TypingTitle::new(
        TypingTitle::DEFAULT_TEXT,
        settings.typing_char_delay,
        settings.typing_hold,
    );

    let mut splash = SplashScreen::new();
    let mut card = CardTilt::new(card_for(background.bounds()));

    let signal = StopSignal::new();
    let mut scheduler = Scheduler::new(&signal);
    scheduler.start();
    let mut preset = 0;

    let target_fps = background.settings().target_fps.max(1);
    let frame_duration = Duration::from_secs_f32(1.0 / target_fps as f32);
    let mut last_update = Instant::now();

    println!("=== Particle Field ===");
    println!("Controls:");
    println!("  Enter: Enter the page");
    println!("  Mouse: Tilt the title card");
    println!("  T: Toggle dark/light theme");
    println!("  R: Cycle viewport size");
    println!("  S: Stop the animation");
    println!("  Q: Quit");

    'main_loop: loop {
        let now = Instant::now();
        let dt = now.duration_since(last_update).as_secs_f32();
        last_update = now;

        title.update(dt);
        splash.update(dt);

        let theme = themes.theme();
        let reschedule = {
            let mut surface = SimulatorSurface::new(&mut display, theme);
            scheduler.frame(&mut background, &mut surface)?
        };
        // a halted loop leaves its last frame on screen
        if reschedule == Reschedule::NextFrame {
            if splash.splash_visible() {
                draw_splash(&mut display, &splash, theme, background.bounds())?;
            }
            if splash.content_visible() {
                draw_content(&mut display, title.visible(), &card, &splash, theme, background.bounds())?;
            }
        }
        draw_status(&mut display, theme, background.bounds(), &scheduler)?;
        window.update(&display);

        for event in window.events() {
            match event {
                SimulatorEvent::Quit => break 'main_loop,
                SimulatorEvent::MouseMove { point } => {
                    if splash.content_visible() {
                        card.pointer_moved(point.x as f32, point.y as f32);
                    }
                }
                SimulatorEvent::KeyDown { keycode, .. } => {
                    let key = format!("{:?}", keycode).to_lowercase();
                    match key.as_str() {
                        // Enter - leave the splash screen
                        "return" | "kpenter" => {
                            if splash.enter() {
                                info!("entering page");
                            }
                        }
                        // T (or Ctrl+T) - theme
                        "t" => match themes.toggle() {
                            Ok(theme) => info!("theme: {}", theme),
                            Err(e) => error!("theme switched but not saved: {}", e),
                        },
                        // R - resize viewport
                        "r" => {
                            preset = (preset + 1) % VIEWPORT_PRESETS.len();
                            let (w, h) = VIEWPORT_PRESETS[preset];
                            background.resize(w, h);
                            card = CardTilt::new(card_for(background.bounds()));
                            info!("viewport: {}x{}", w, h);
                        }
                        // S - host teardown
                        "s" => scheduler.stop(),
                        "q" => break 'main_loop,
                        _ => {}
                    }
                }
                _ => {}
            }
        }

        // Frame rate limiting
        let elapsed = now.elapsed();
        if elapsed < frame_duration {
            thread::sleep(frame_duration - elapsed);
        }
    }

    scheduler.stop();
    info!("exiting after {} frames", scheduler.frames());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blend_extremes() {
        let bg = Rgb565::new(2, 4, 6);
        assert_eq!(blend_white(bg, 0.0), bg);
        assert_eq!(blend_white(bg, 1.0), Rgb565::WHITE);
        assert_eq!(blend_white(bg, 7.0), Rgb565::WHITE);
    }

    #[test]
    fn blend_is_monotonic() {
        let bg = backdrop(Theme::Dark);
        let low = blend_white(bg, 0.1);
        let high = blend_white(bg, 0.4);
        assert!(high.g() >= low.g());
        assert!(low.g() >= bg.g());
    }

    #[test]
    fn surface_draws_into_viewport_only() {
        let mut display = SimulatorDisplay::<Rgb565>::new(Size::new(40, 20));
        let mut surface = SimulatorSurface::new(&mut display, Theme::Dark);
        surface.clear(Extent::new(20.0, 20.0)).unwrap();
        surface.fill_disc(19.0, 10.0, 3.0, 1.0).unwrap();

        assert_eq!(display.get_pixel(Point::new(19, 10)), Rgb565::WHITE);
        assert_eq!(display.get_pixel(Point::new(21, 10)), LETTERBOX);
        assert_eq!(display.get_pixel(Point::new(2, 2)), backdrop(Theme::Dark));
    }

    #[test]
    fn status_bar_sits_below_every_viewport() {
        let size = display_size();
        for (w, h) in VIEWPORT_PRESETS {
            assert!(w as u32 <= size.width);
            assert!(h as u32 + STATUS_BAR_HEIGHT <= size.height);
        }
    }

    #[test]
    fn status_bar_leaves_particles_untouched() {
        let signal = StopSignal::new();
        let scheduler = Scheduler::new(&signal);
        let mut display = SimulatorDisplay::<Rgb565>::new(display_size());
        let (w, h) = VIEWPORT_PRESETS[0];
        {
            let mut surface = SimulatorSurface::new(&mut display, Theme::Dark);
            surface.clear(Extent::new(w, h)).unwrap();
            surface.fill_disc(100.0, h - 1.0, 3.0, 1.0).unwrap();
        }
        draw_status(&mut display, Theme::Dark, Extent::new(w, h), &scheduler).unwrap();
        assert_eq!(display.get_pixel(Point::new(100, h as i32 - 1)), Rgb565::WHITE);
    }

    #[test]
    fn resting_card_is_its_rectangle() {
        let card = card_for(Extent::new(640.0, 360.0));
        let corners = card_corners(&card, Tilt::REST);
        assert_eq!(corners[0], Point::new(210, 148));
        assert_eq!(corners[2], Point::new(430, 212));
    }

    #[test]
    fn tilted_card_skews_away_from_pointer() {
        let card = card_for(Extent::new(640.0, 360.0));
        let mut tilt = CardTilt::new(card);
        // pointer at the card's top-left corner
        let leaning = tilt.pointer_moved(card.x, card.y);
        let corners = card_corners(&card, leaning);
        let rest = card_corners(&card, Tilt { scale: leaning.scale, ..Tilt::REST });
        assert_ne!(corners, rest);
        // rotate_y > 0 shortens the left edge
        assert!(corners[3].y - corners[0].y < rest[3].y - rest[0].y);
    }

    #[test]
    fn blend_reaches_foreground() {
        let bg = backdrop(Theme::Light);
        let fg = text_color(Theme::Light);
        assert_eq!(blend(bg, fg, 0.0), bg);
        assert_eq!(blend(bg, fg, 1.0), fg);
    }

    #[test]
    fn file_preferences_round_trip_theme() {
        let dir = std::env::temp_dir().join(format!("particle-field-test-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        let store = FilePreferences::open(dir.clone()).unwrap();
        let mut themes = ThemeManager::load(store);
        assert_eq!(themes.theme(), Theme::Dark);
        themes.toggle().unwrap();

        let reloaded = ThemeManager::load(FilePreferences::open(dir.clone()).unwrap());
        assert_eq!(reloaded.theme(), Theme::Light);
        let _ = fs::remove_dir_all(dir);
    }
}
