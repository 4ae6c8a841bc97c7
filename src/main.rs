use ab_glyph::FontVec;
use anyhow::{anyhow, Context, Result};
use clap::Parser;
use instant::Duration;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{warn, Level};

use crossfill::render::save_png;
use crossfill::{
    find_fill, generate_grid_config_from_template_string, render_grid, FillFailure, FillOptions,
    WordList,
};

#[derive(Parser, Debug)]
#[command(name = "crossfill", version, about = "Fill a crossword structure from a word list")]
struct Args {
    /// Structure file: `_` for open cells, anything else is a block
    structure: PathBuf,

    /// Word list file, one word per line
    words: PathBuf,

    /// Also write the filled grid to this file, as an image if it ends in `.png`
    output: Option<PathBuf>,

    /// TrueType/OpenType font used to draw letters into `.png` output
    #[arg(long, value_name = "PATH")]
    font: Option<PathBuf>,

    /// Prune crossing domains after every choice during search
    #[arg(long)]
    forward_checking: bool,

    /// Give up after this many seconds of search
    #[arg(long, value_name = "SECONDS")]
    timeout: Option<u64>,

    /// Log consistency and search progress to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::WARN })
        .with_writer(std::io::stderr)
        .init();

    let words = fs::read_to_string(&args.words)
        .with_context(|| format!("failed to read word list {}", args.words.display()))?;
    let structure = fs::read_to_string(&args.structure)
        .with_context(|| format!("failed to read structure {}", args.structure.display()))?;

    let config = generate_grid_config_from_template_string(WordList::parse(&words), &structure)
        .with_context(|| format!("invalid structure {}", args.structure.display()))?;

    let mut options = FillOptions::default().with_forward_checking(args.forward_checking);
    if let Some(seconds) = args.timeout {
        options = options.with_timeout(Duration::from_secs(seconds));
    }

    let result = match find_fill(&config, &options) {
        Ok(result) => result,
        Err(FillFailure::Unsatisfiable) => {
            println!("No solution.");
            return Ok(());
        }
        Err(FillFailure::Timeout) => anyhow::bail!("no fill found within the time limit"),
        Err(FillFailure::Abort) => anyhow::bail!("fill aborted"),
    };

    let display_grid = render_grid(&config, &result.choices);

    println!("{}", display_grid);
    if args.verbose {
        eprintln!("{:?}", result.statistics);
    }

    if let Some(output) = &args.output {
        let is_png = output
            .extension()
            .map_or(false, |extension| extension.eq_ignore_ascii_case("png"));

        if is_png {
            let font = args.font.as_deref().map(load_font).transpose()?;
            if font.is_none() {
                warn!("no --font given, so the image will have empty cells");
            }
            save_png(&config, &result.choices, font.as_ref(), output)
                .with_context(|| format!("failed to write {}", output.display()))?;
        } else {
            fs::write(output, format!("{}\n", display_grid))
                .with_context(|| format!("failed to write {}", output.display()))?;
        }
    }

    Ok(())
}

fn load_font(path: &Path) -> Result<FontVec> {
    let bytes =
        fs::read(path).with_context(|| format!("failed to read font {}", path.display()))?;
    FontVec::try_from_vec(bytes).map_err(|err| anyhow!("invalid font {}: {}", path.display(), err))
}
