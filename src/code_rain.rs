use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::schedule::Scheduler;

pub const GLYPHS: &[u8] = b"01{}[]()<>=+-*/&|!@#$%^";
pub const GLYPH_SIZE: f64 = 14.0;
pub const TICK_MILLIS: u32 = 100;
pub const TRAIL_FILL: &str = "rgba(15, 23, 42, 0.05)";
pub const GLYPH_RGB: (u8, u8, u8) = (30, 64, 175);
pub const MAX_GLYPH_ALPHA: f64 = 0.5;
/// A column below the bottom edge restarts when an entropy draw lands above this.
pub const RESET_THRESHOLD: f64 = 0.975;

/// Drawing target for the falling glyph background.
pub trait RainSurface {
    fn viewport_size(&self) -> (f64, f64);
    fn set_size(&mut self, width: f64, height: f64);
    /// Dims what is already drawn instead of clearing it.
    fn fade(&mut self, width: f64, height: f64);
    fn draw_glyph(&mut self, glyph: char, x: f64, y: f64, alpha: f64);
}

/// Uniform draws in `[0, 1)`.
pub trait Entropy {
    fn next_unit(&mut self) -> f64;
}

#[derive(Clone, Debug, PartialEq)]
pub struct RainField {
    width: f64,
    height: f64,
    glyph_size: f64,
    drops: Vec<u32>,
}

impl RainField {
    pub fn new(width: f64, height: f64, glyph_size: f64) -> Self {
        let columns = column_count(width, glyph_size);
        Self {
            width,
            height,
            glyph_size,
            drops: vec![0; columns],
        }
    }

    pub fn column_count(&self) -> usize {
        self.drops.len()
    }

    pub fn drops(&self) -> &[u32] {
        &self.drops
    }

    /// Surviving columns keep falling from where they were; new columns start at the top.
    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
        self.drops.resize(column_count(width, self.glyph_size), 0);
    }

    pub fn tick<S, E>(&mut self, surface: &mut S, entropy: &mut E)
    where
        S: RainSurface + ?Sized,
        E: Entropy + ?Sized,
    {
        surface.fade(self.width, self.height);

        for (index, drop_row) in self.drops.iter_mut().enumerate() {
            let glyph = pick_glyph(entropy.next_unit());
            let x = index as f64 * self.glyph_size;
            let y = f64::from(*drop_row) * self.glyph_size;
            let alpha = entropy.next_unit().clamp(0.0, 1.0) * MAX_GLYPH_ALPHA;
            surface.draw_glyph(glyph, x, y, alpha);

            if y > self.height && entropy.next_unit() > RESET_THRESHOLD {
                *drop_row = 0;
            }
            *drop_row = drop_row.saturating_add(1);
        }
    }
}

pub fn column_count(width: f64, glyph_size: f64) -> usize {
    if !(width > 0.0) || !(glyph_size > 0.0) {
        return 0;
    }

    (width / glyph_size).floor() as usize
}

fn pick_glyph(unit: f64) -> char {
    let index = (unit.clamp(0.0, 1.0) * GLYPHS.len() as f64) as usize;
    char::from(GLYPHS[index.min(GLYPHS.len() - 1)])
}

struct RainState<F, E> {
    surface: F,
    entropy: E,
    field: RainField,
}

impl<F: RainSurface, E: Entropy> RainState<F, E> {
    fn fit_viewport(&mut self) {
        let (width, height) = self.surface.viewport_size();
        self.surface.set_size(width, height);
        self.field.resize(width, height);
    }
}

/// Running background animation. Dropping it stops the tick loop.
pub struct RainHandle<F, E, S: Scheduler> {
    state: Rc<RefCell<RainState<F, E>>>,
    task: Option<S::Task>,
}

impl<F, E, S> RainHandle<F, E, S>
where
    F: RainSurface + 'static,
    E: Entropy + 'static,
    S: Scheduler,
{
    /// `None` when there is no surface to draw on.
    pub fn mount(surface: Option<F>, scheduler: &S, entropy: E) -> Option<Self> {
        let surface = surface?;
        let mut state = RainState {
            surface,
            entropy,
            field: RainField::new(0.0, 0.0, GLYPH_SIZE),
        };
        state.fit_viewport();

        let state = Rc::new(RefCell::new(state));
        let weak: Weak<RefCell<RainState<F, E>>> = Rc::downgrade(&state);
        let task = scheduler.interval(TICK_MILLIS, move || {
            let Some(state) = weak.upgrade() else {
                return;
            };
            let mut state = state.borrow_mut();
            let RainState {
                surface,
                entropy,
                field,
            } = &mut *state;
            field.tick(surface, entropy);
        });

        Some(Self {
            state,
            task: Some(task),
        })
    }

    /// Re-measures the viewport; call from the host's resize listener.
    pub fn resize(&self) {
        self.state.borrow_mut().fit_viewport();
    }

    pub fn column_count(&self) -> usize {
        self.state.borrow().field.column_count()
    }

    pub fn drops(&self) -> Vec<u32> {
        self.state.borrow().field.drops().to_vec()
    }

    pub fn unmount(self) {}
}

impl<F, E, S: Scheduler> Drop for RainHandle<F, E, S> {
    fn drop(&mut self) {
        self.task.take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::ManualScheduler;
    use std::cell::Cell;

    #[derive(Default)]
    struct SpyLog {
        sizes: Vec<(f64, f64)>,
        fades: usize,
        glyphs: Vec<(char, f64, f64, f64)>,
    }

    struct SpySurface {
        viewport: Rc<Cell<(f64, f64)>>,
        log: Rc<RefCell<SpyLog>>,
    }

    impl RainSurface for SpySurface {
        fn viewport_size(&self) -> (f64, f64) {
            self.viewport.get()
        }

        fn set_size(&mut self, width: f64, height: f64) {
            self.log.borrow_mut().sizes.push((width, height));
        }

        fn fade(&mut self, _width: f64, _height: f64) {
            self.log.borrow_mut().fades += 1;
        }

        fn draw_glyph(&mut self, glyph: char, x: f64, y: f64, alpha: f64) {
            self.log.borrow_mut().glyphs.push((glyph, x, y, alpha));
        }
    }

    struct Cycle {
        values: Vec<f64>,
        next: usize,
    }

    impl Cycle {
        fn new(values: &[f64]) -> Self {
            Self {
                values: values.to_vec(),
                next: 0,
            }
        }
    }

    impl Entropy for Cycle {
        fn next_unit(&mut self) -> f64 {
            let value = self.values[self.next % self.values.len()];
            self.next += 1;
            value
        }
    }

    fn spy(width: f64, height: f64) -> (SpySurface, Rc<Cell<(f64, f64)>>, Rc<RefCell<SpyLog>>) {
        let viewport = Rc::new(Cell::new((width, height)));
        let log = Rc::new(RefCell::new(SpyLog::default()));
        let surface = SpySurface {
            viewport: viewport.clone(),
            log: log.clone(),
        };
        (surface, viewport, log)
    }

    #[test]
    fn column_count_floors_partial_columns() {
        assert_eq!(column_count(1000.0, GLYPH_SIZE), 71);
        assert_eq!(column_count(13.9, GLYPH_SIZE), 0);
        assert_eq!(column_count(0.0, GLYPH_SIZE), 0);
        assert_eq!(column_count(f64::NAN, GLYPH_SIZE), 0);
    }

    #[test]
    fn glyph_pick_stays_in_the_set() {
        assert_eq!(pick_glyph(0.0), '0');
        assert_eq!(pick_glyph(0.9999), '^');
        assert_eq!(pick_glyph(1.0), '^');
    }

    #[test]
    fn tick_fades_once_then_draws_every_column() {
        let (mut surface, _, log) = spy(70.0, 140.0);
        let mut field = RainField::new(70.0, 140.0, GLYPH_SIZE);
        let mut entropy = Cycle::new(&[0.0, 0.5]);

        field.tick(&mut surface, &mut entropy);

        let log = log.borrow();
        assert_eq!(log.fades, 1);
        assert_eq!(log.glyphs.len(), 5);
        assert_eq!(log.glyphs[2], ('0', 28.0, 0.0, 0.25));
        assert_eq!(field.drops(), &[1, 1, 1, 1, 1]);
    }

    #[test]
    fn columns_fall_until_a_lucky_reset_below_the_bottom() {
        let (mut surface, _, _) = spy(14.0, 28.0);
        let mut field = RainField::new(14.0, 28.0, GLYPH_SIZE);
        let mut never = Cycle::new(&[0.1]);

        for _ in 0..10 {
            field.tick(&mut surface, &mut never);
        }
        assert_eq!(field.drops(), &[10]);

        let mut always = Cycle::new(&[0.99]);
        field.tick(&mut surface, &mut always);
        assert_eq!(field.drops(), &[1]);
    }

    #[test]
    fn restarted_column_next_draws_on_the_first_row() {
        let (mut surface, _, log) = spy(14.0, 28.0);
        let mut field = RainField::new(14.0, 28.0, GLYPH_SIZE);
        let mut never = Cycle::new(&[0.1]);
        for _ in 0..4 {
            field.tick(&mut surface, &mut never);
        }

        let mut always = Cycle::new(&[0.99]);
        field.tick(&mut surface, &mut always);
        field.tick(&mut surface, &mut never);

        let log = log.borrow();
        let rows: Vec<f64> = log.glyphs.iter().map(|(_, _, y, _)| *y).collect();
        assert_eq!(rows, vec![0.0, 14.0, 28.0, 42.0, 56.0, 14.0]);
    }

    #[test]
    fn columns_on_screen_never_reset() {
        let (mut surface, _, _) = spy(14.0, 1000.0);
        let mut field = RainField::new(14.0, 1000.0, GLYPH_SIZE);
        let mut always = Cycle::new(&[0.99]);

        for _ in 0..5 {
            field.tick(&mut surface, &mut always);
        }
        assert_eq!(field.drops(), &[5]);
    }

    #[test]
    fn mount_sizes_surface_to_viewport() {
        let scheduler = ManualScheduler::new();
        let (surface, _, log) = spy(1000.0, 700.0);

        let handle = RainHandle::mount(Some(surface), &scheduler, Cycle::new(&[0.3]))
            .expect("surface present");

        assert_eq!(handle.column_count(), 71);
        assert!(handle.drops().iter().all(|row| *row == 0));
        assert_eq!(log.borrow().sizes, vec![(1000.0, 700.0)]);
        assert_eq!(scheduler.pending(), 1);
    }

    #[test]
    fn mount_without_surface_is_a_no_op() {
        let scheduler = ManualScheduler::new();
        let handle: Option<RainHandle<SpySurface, Cycle, ManualScheduler>> =
            RainHandle::mount(None, &scheduler, Cycle::new(&[0.3]));

        assert!(handle.is_none());
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn ticks_follow_the_interval() {
        let scheduler = ManualScheduler::new();
        let (surface, _, log) = spy(140.0, 700.0);
        let handle = RainHandle::mount(Some(surface), &scheduler, Cycle::new(&[0.3]))
            .expect("surface present");

        scheduler.advance(u64::from(TICK_MILLIS) * 3);

        assert_eq!(log.borrow().fades, 3);
        assert_eq!(log.borrow().glyphs.len(), 30);
        assert_eq!(handle.drops(), vec![3; 10]);
    }

    #[test]
    fn resize_recomputes_columns_and_keeps_survivors() {
        let scheduler = ManualScheduler::new();
        let (surface, viewport, log) = spy(140.0, 700.0);
        let handle = RainHandle::mount(Some(surface), &scheduler, Cycle::new(&[0.3]))
            .expect("surface present");
        scheduler.advance(u64::from(TICK_MILLIS) * 2);

        viewport.set((70.0, 400.0));
        handle.resize();
        assert_eq!(handle.column_count(), 5);
        assert_eq!(handle.drops(), vec![2; 5]);

        viewport.set((210.0, 400.0));
        handle.resize();
        assert_eq!(handle.column_count(), 15);
        assert_eq!(&handle.drops()[..5], &[2; 5]);
        assert_eq!(&handle.drops()[5..], &[0; 10]);
        assert_eq!(log.borrow().sizes.last(), Some(&(210.0, 400.0)));
    }

    #[test]
    fn unmount_stops_all_drawing() {
        let scheduler = ManualScheduler::new();
        let (surface, _, log) = spy(140.0, 700.0);
        let handle = RainHandle::mount(Some(surface), &scheduler, Cycle::new(&[0.3]))
            .expect("surface present");
        scheduler.advance(u64::from(TICK_MILLIS));
        let drawn = log.borrow().glyphs.len();

        handle.unmount();
        assert_eq!(scheduler.pending(), 0);

        scheduler.advance(u64::from(TICK_MILLIS) * 50);
        assert_eq!(log.borrow().glyphs.len(), drawn);
        assert_eq!(log.borrow().fades, 1);
    }

    #[test]
    fn unmount_before_first_tick_draws_nothing() {
        let scheduler = ManualScheduler::new();
        let (surface, _, log) = spy(140.0, 700.0);
        let handle = RainHandle::mount(Some(surface), &scheduler, Cycle::new(&[0.3]))
            .expect("surface present");

        handle.unmount();
        scheduler.advance(10_000);

        assert_eq!(scheduler.pending(), 0);
        assert!(log.borrow().glyphs.is_empty());
    }
}
