use anyhow::{Context, anyhow, bail};
use gentle_coords::{
    Point, PositionedTarget, ReadingFrame, Sequence, SequenceType, Shape, Topology, about,
    identity::IdentityRegistry, parameters::ModelParameters,
};
use itertools::Itertools;
use log::debug;
use serde::Serialize;
use std::env;

#[derive(Serialize)]
struct SizeSummary {
    length: usize,
    size: i64,
    shape: Shape,
    sequence_type: SequenceType,
}

#[derive(Serialize)]
struct ConvertedSize {
    from: SequenceType,
    to: SequenceType,
    length: usize,
    size: i64,
}

#[derive(Serialize)]
struct NormalizedPosition {
    raw: i64,
    position: i64,
    did_wrap: bool,
    between: bool,
}

#[derive(Serialize)]
struct CharAt {
    position: i64,
    character: char,
}

#[derive(Serialize)]
struct Walk {
    start: i64,
    step_size: i64,
    slice_size: usize,
    windows: Vec<String>,
}

fn usage() {
    eprintln!(
        "Usage:\n  \
  gentle_coords_cli --version\n  \
  gentle_coords_cli [OPTIONS] size SEQUENCE\n  \
  gentle_coords_cli [OPTIONS] size-as SEQUENCE nucleotide|aminoacid\n  \
  gentle_coords_cli [OPTIONS] char-at SEQUENCE POSITION\n  \
  gentle_coords_cli [OPTIONS] normalize SEQUENCE POSITION\n  \
  gentle_coords_cli [OPTIONS] walk SEQUENCE START [--step N] [--slice N] [--allow-incomplete]\n  \
  gentle_coords_cli [OPTIONS] codons SEQUENCE FRAME\n\n  \
  Options: --circular, --type nucleotide|aminoacid|unknown, --params PATH\n  \
  Positions are in the dual coordinate space: odd = on an element, even = between elements"
    );
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let text = serde_json::to_string_pretty(value).context("Could not serialize JSON output")?;
    println!("{text}");
    Ok(())
}

fn take_flag(args: &mut Vec<String>, flag: &str) -> bool {
    match args.iter().find_position(|a| *a == flag) {
        Some((index, _)) => {
            args.remove(index);
            true
        }
        None => false,
    }
}

fn take_value(args: &mut Vec<String>, flag: &str) -> anyhow::Result<Option<String>> {
    let Some((index, _)) = args.iter().find_position(|a| *a == flag) else {
        return Ok(None);
    };
    if index + 1 >= args.len() {
        bail!("Missing value for {flag}");
    }
    let value = args.remove(index + 1);
    args.remove(index);
    Ok(Some(value))
}

fn parse_type(value: &str) -> anyhow::Result<SequenceType> {
    match value.to_ascii_lowercase().as_str() {
        "nucleotide" | "nt" | "dna" => Ok(SequenceType::Nucleotide),
        "aminoacid" | "aa" | "protein" => Ok(SequenceType::AminoAcid),
        "unknown" => Ok(SequenceType::Unknown),
        _ => Err(anyhow!("Unknown sequence type '{value}'")),
    }
}

fn parse_number(value: &str, what: &str) -> anyhow::Result<i64> {
    value
        .parse()
        .with_context(|| format!("Invalid {what} '{value}'"))
}

fn positional<'a>(args: &'a [String], index: usize, what: &str) -> anyhow::Result<&'a str> {
    args.get(index).map(|s| s.as_str()).ok_or_else(|| {
        usage();
        anyhow!("Missing {what}")
    })
}

fn main() {
    pretty_env_logger::init();
    if let Err(e) = run() {
        eprintln!("{e:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let mut args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() {
        usage();
        bail!("Missing command");
    }
    if args.iter().any(|a| a == "--version" || a == "-V") {
        println!("{}", about::version_cli_text());
        return Ok(());
    }

    let parameters = match take_value(&mut args, "--params")? {
        Some(path) => ModelParameters::load_from_path(&path)?,
        None => ModelParameters::default(),
    };
    let shape = match take_flag(&mut args, "--circular") {
        true => Shape::Circular,
        false => Shape::Linear,
    };
    let sequence_type = match take_value(&mut args, "--type")? {
        Some(value) => parse_type(&value)?,
        None => SequenceType::Nucleotide,
    };
    let mut walk = parameters.walk;
    if let Some(step) = take_value(&mut args, "--step")? {
        walk.step_size = parse_number(&step, "step")?;
    }
    if let Some(slice) = take_value(&mut args, "--slice")? {
        walk.slice_size = slice
            .parse()
            .with_context(|| format!("Invalid slice size '{slice}'"))?;
    }
    if take_flag(&mut args, "--allow-incomplete") {
        walk.allow_incomplete = true;
    }

    let command = positional(&args, 0, "command")?.to_string();
    let text = positional(&args, 1, "sequence")?;
    let sequence = Sequence::new(&IdentityRegistry::new(), text, sequence_type, shape);
    debug!("Running '{command}' on {} elements", sequence.len());

    match command.as_str() {
        "size" => print_json(&SizeSummary {
            length: sequence.len(),
            size: sequence.size(),
            shape: sequence.shape(),
            sequence_type: sequence.sequence_type(),
        }),
        "size-as" => {
            let to = parse_type(positional(&args, 2, "target type")?)?;
            print_json(&ConvertedSize {
                from: sequence.sequence_type(),
                to,
                length: sequence.len_as(to)?,
                size: sequence.size_as(to)?,
            })
        }
        "char-at" => {
            let position = parse_number(positional(&args, 2, "position")?, "position")?;
            let point = Point::with_step_size(&sequence, position, parameters.default_step_size)?;
            print_json(&CharAt {
                position: point.position(),
                character: sequence.char_at(&point)?,
            })
        }
        "normalize" => {
            let raw = parse_number(positional(&args, 2, "position")?, "position")?;
            let mut scratch = Topology::orphan();
            let probe = scratch
                .add_point(Point::with_step_size(&sequence, 1, parameters.default_step_size)?)
                .ok_or_else(|| anyhow!("Scratch topology refused the probe point"))?;
            scratch.set_point_position(probe, raw, &sequence)?;
            let point = scratch
                .point(probe)
                .ok_or_else(|| anyhow!("Probe point went missing"))?;
            print_json(&NormalizedPosition {
                raw,
                position: point.position(),
                did_wrap: point.did_wrap(),
                between: point.is_between(),
            })
        }
        "walk" => {
            let start = parse_number(positional(&args, 2, "start")?, "start")?;
            let walker = sequence.walk_with(start, walk)?;
            print_json(&Walk {
                start: walker.start(),
                step_size: walk.step_size,
                slice_size: walk.slice_size,
                windows: walker.collect(),
            })
        }
        "codons" => {
            let frame = parse_number(positional(&args, 2, "frame")?, "frame")?;
            let frame = i8::try_from(frame)
                .ok()
                .and_then(ReadingFrame::from_frame)
                .ok_or_else(|| anyhow!("Reading frames are -3..=3, got {frame}"))?;
            let codons: Vec<String> = sequence.codons(frame)?.collect();
            print_json(&codons)
        }
        _ => {
            usage();
            Err(anyhow!("Unknown command '{command}'"))
        }
    }
}
