//! Interactive command prompt
//!
//! Accepts `genmodel <path>`, `gentexture <path>`, `inspect <path>` and
//! `exit`. A failing command is reported and the prompt continues.

use anyhow::Result;
use std::io::{BufRead, Write};
use std::path::Path;

/// A parsed prompt line.
#[derive(Debug, PartialEq, Eq)]
pub enum Command<'a> {
    GenModel(&'a str),
    GenTexture(&'a str),
    Inspect(&'a str),
    Exit,
    Help,
}

pub fn parse_command(line: &str) -> Result<Option<Command<'_>>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (name, arg) = match line.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (line, ""),
    };
    let command = match name {
        "genmodel" => Command::GenModel(require_path(name, arg)?),
        "gentexture" => Command::GenTexture(require_path(name, arg)?),
        "inspect" => Command::Inspect(require_path(name, arg)?),
        "exit" | "quit" => Command::Exit,
        "help" => Command::Help,
        other => anyhow::bail!("unknown command '{other}' (try 'help')"),
    };
    Ok(Some(command))
}

fn require_path<'a>(name: &str, arg: &'a str) -> Result<&'a str> {
    anyhow::ensure!(!arg.is_empty(), "usage: {name} <path>");
    Ok(arg)
}

fn run_command(command: &Command<'_>, output: &mut impl Write) -> Result<()> {
    match command {
        Command::GenModel(path) => {
            let written = crate::mesh::convert_mesh(Path::new(path), None)?;
            writeln!(output, "wrote {}", written.display())?;
        }
        Command::GenTexture(path) => {
            let written = crate::texture::convert_image(Path::new(path), None, true)?;
            writeln!(output, "wrote {}", written.display())?;
        }
        Command::Inspect(path) => {
            write!(output, "{}", crate::inspect::describe(Path::new(path))?)?;
        }
        Command::Help => {
            writeln!(output, "commands: genmodel <path>, gentexture <path>, inspect <path>, exit")?;
        }
        Command::Exit => {}
    }
    Ok(())
}

/// Run the prompt until `exit` or end of input.
///
/// Returns the number of commands that failed.
pub fn run<R: BufRead, W: Write>(input: R, mut output: W) -> Result<usize> {
    let mut failures = 0;
    write!(output, "> ")?;
    output.flush()?;

    for line in input.lines() {
        let line = line?;
        match parse_command(&line) {
            Ok(Some(Command::Exit)) => return Ok(failures),
            Ok(Some(command)) => {
                if let Err(err) = run_command(&command, &mut output) {
                    tracing::error!("{:#}", err);
                    writeln!(output, "error: {err:#}")?;
                    failures += 1;
                }
            }
            Ok(None) => {}
            Err(err) => writeln!(output, "error: {err}")?,
        }
        write!(output, "> ")?;
        output.flush()?;
    }
    Ok(failures)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            parse_command("genmodel  models/a b.obj ").unwrap(),
            Some(Command::GenModel("models/a b.obj"))
        );
        assert_eq!(
            parse_command("gentexture t.png").unwrap(),
            Some(Command::GenTexture("t.png"))
        );
        assert_eq!(parse_command("exit").unwrap(), Some(Command::Exit));
        assert_eq!(parse_command("   ").unwrap(), None);
        assert!(parse_command("genmodel").is_err());
        assert!(parse_command("explode now").is_err());
    }

    #[test]
    fn test_failure_does_not_stop_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let obj = dir.path().join("tri.obj");
        std::fs::write(&obj, "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();

        let script = format!(
            "genmodel {}\nbogus\ngenmodel {}\nexit\ngenmodel {}\n",
            dir.path().join("missing.obj").display(),
            obj.display(),
            obj.display()
        );
        let mut output = Vec::new();
        let failures = run(script.as_bytes(), &mut output).unwrap();

        assert_eq!(failures, 1);
        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("error: unknown command 'bogus'"));
        assert!(text.contains("tri.lmesh"));
        assert!(dir.path().join("tri.lmesh").exists());
    }
}
