use std::env;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::process;

use chip8emu::display::MonoTermDisplay;
use chip8emu::error::Chip8Error;
use chip8emu::input::StdinInput;
use chip8emu::interpreter::{Chip8Interpreter, CHIP8_DEFAULT_IPS};
use chip8emu::sound::SimpleBeep;

fn main() {
    env_logger::init();

    match run() {
        Ok(()) => {}
        // Esc in the input layer surfaces as Interrupted: a clean quit
        Err(Chip8Error::Io(ref e)) if e.kind() == io::ErrorKind::Interrupted => {}
        Err(e) => {
            eprintln!("chip8emu: {}", e);
            process::exit(1);
        }
    }

    // shove some junk on stdout to stop the cli messing up the last frame
    for _ in 0..12 {
        println!();
    }
}

fn run() -> Result<(), Chip8Error> {
    let path = rom_path()?;

    let mut display = MonoTermDisplay::new()?;
    let mut input = StdinInput::new()?;
    let mut sound = SimpleBeep::new();
    let mut interpreter = Chip8Interpreter::new(&mut display, &mut input, &mut sound)?;

    let mut f = File::open(&path).map_err(|source| Chip8Error::ResourceInit {
        path: path.clone(),
        source,
    })?;
    interpreter.load_program(&mut f)?;
    log::info!("running {:?} at {} ips", path, CHIP8_DEFAULT_IPS);

    interpreter.run(CHIP8_DEFAULT_IPS)
}

/// program path from argv; pointing at a directory picks the first *.ch8
/// file inside it
fn rom_path() -> Result<PathBuf, Chip8Error> {
    let arg = env::args().nth(1).unwrap_or_else(|| "roms".to_string());
    let path = PathBuf::from(arg);
    if path.is_dir() {
        find_first_rom(&path)
    } else {
        Ok(path)
    }
}

fn find_first_rom(dir: &Path) -> Result<PathBuf, Chip8Error> {
    let entries = dir.read_dir().map_err(|source| Chip8Error::ResourceInit {
        path: dir.to_path_buf(),
        source,
    })?;
    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().map_or(false, |ext| ext == "ch8") {
            return Ok(path);
        }
    }
    Err(Chip8Error::ResourceInit {
        path: dir.to_path_buf(),
        source: io::Error::new(io::ErrorKind::NotFound, "no *.ch8 file found"),
    })
}
