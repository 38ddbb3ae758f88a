use std::io;
use tui::backend::CrosstermBackend;
use tui::layout::Rect;
use tui::style::{Color, Style};
use tui::symbols::Marker;
use tui::widgets::canvas::{Canvas, Points};
use tui::widgets::{Block, Borders};
use tui::Terminal;

pub const CHIP8_DISPLAY_COLS: usize = 64;
pub const CHIP8_DISPLAY_ROWS: usize = 32;

/// The 64x32 monochrome pixel grid the interpreter draws into. All
/// coordinate arithmetic wraps modulo the grid size, so no out-of-bounds
/// pixel access is observable. The reprint flag tells the renderer a redraw
/// is due; any draw or clear sets it, `take_reprint` clears it.
pub struct Framebuffer {
    pixels: [[bool; CHIP8_DISPLAY_COLS]; CHIP8_DISPLAY_ROWS],
    reprint: bool,
}

impl Framebuffer {
    pub fn new() -> Self {
        Framebuffer {
            pixels: [[false; CHIP8_DISPLAY_COLS]; CHIP8_DISPLAY_ROWS],
            reprint: false,
        }
    }

    pub fn rows(&self) -> usize {
        CHIP8_DISPLAY_ROWS
    }

    pub fn cols(&self) -> usize {
        CHIP8_DISPLAY_COLS
    }

    /// read one pixel, wrapping on both axes
    pub fn pixel(&self, row: usize, col: usize) -> bool {
        self.pixels[row % CHIP8_DISPLAY_ROWS][col % CHIP8_DISPLAY_COLS]
    }

    /// XOR one pixel, wrapping on both axes; returns whether the pixel was
    /// lit beforehand (the sprite collision signal)
    pub fn flip(&mut self, row: usize, col: usize) -> bool {
        let px = &mut self.pixels[row % CHIP8_DISPLAY_ROWS][col % CHIP8_DISPLAY_COLS];
        let was_lit = *px;
        *px = !*px;
        self.reprint = true;
        was_lit
    }

    /// switch every pixel off
    pub fn clear(&mut self) {
        self.pixels = [[false; CHIP8_DISPLAY_COLS]; CHIP8_DISPLAY_ROWS];
        self.reprint = true;
    }

    /// true once per batch of changes; reading resets the flag, so the
    /// renderer only repaints when something actually changed
    pub fn take_reprint(&mut self) -> bool {
        let r = self.reprint;
        self.reprint = false;
        r
    }

    /// lit pixels as float coords for the TUI canvas (y grows downward on
    /// the chip-8, upward on the canvas, hence the negation)
    fn lit_points(&self) -> impl std::iter::Iterator<Item = (f64, f64)> + '_ {
        self.pixels.iter().enumerate().flat_map(|(row, cols)| {
            cols.iter()
                .enumerate()
                .filter(|(_, lit)| **lit)
                .map(move |(col, _)| (col as f64, -1.0 * row as f64))
        })
    }
}

impl Default for Framebuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Display is used by the interpreter to put the framebuffer on a screen.
/// It abstracts the implementation details, so a variety of kinds of screen
/// would work.
pub trait Display {
    fn draw(&mut self, fb: &Framebuffer) -> Result<(), io::Error>;
}

/// monochrome display in a terminal, rendered using TUI over crossterm
pub struct MonoTermDisplay {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl MonoTermDisplay {
    pub fn new() -> Result<MonoTermDisplay, io::Error> {
        let backend = CrosstermBackend::new(io::stdout());
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;
        Ok(MonoTermDisplay { terminal })
    }
}

impl Display for MonoTermDisplay {
    fn draw(&mut self, fb: &Framebuffer) -> Result<(), io::Error> {
        // 1:1 ratio between terminal cells, chip8 pixels and the TUI canvas
        let size = Rect::new(0, 0, 2 + fb.cols() as u16, 2 + fb.rows() as u16);
        let x_bounds = [0.0, (fb.cols() - 1) as f64];
        let y_bounds = [-1.0 * (fb.rows() - 1) as f64, 0.0];

        self.terminal.draw(|f| {
            let canvas = Canvas::default()
                .block(
                    Block::default()
                        .title("CHIP-8")
                        .borders(Borders::ALL)
                        .style(Style::default().bg(Color::Black)),
                )
                .x_bounds(x_bounds)
                .y_bounds(y_bounds)
                .marker(Marker::Block)
                .paint(|ctx| {
                    ctx.draw(&Points {
                        coords: &fb.lit_points().collect::<Vec<_>>(),
                        color: Color::White,
                    });
                });
            f.render_widget(canvas, size);
        })?;
        Ok(())
    }
}

/// useful for testing non-display routines
pub struct DummyDisplay {
    pub draw_count: usize,
}

impl DummyDisplay {
    pub fn new() -> Self {
        DummyDisplay { draw_count: 0 }
    }
}

impl Default for DummyDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for DummyDisplay {
    fn draw(&mut self, _fb: &Framebuffer) -> Result<(), io::Error> {
        self.draw_count += 1;
        Ok(())
    }
}
