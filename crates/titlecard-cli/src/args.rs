use std::path::PathBuf;

use clap::Parser;
use titlecard_core::RawOptions;

#[derive(Parser, Debug)]
#[command(
    name = "titlecard",
    version,
    about = "Render a show-style title card to a PNG",
    long_about = "Render a show-style title card to a PNG.\n\nThe title is shrunk until it fits the canvas, optionally outlined and tilted,\ndrawn over a background image or a solid color, and finished with an optional\nglitch, distort or shadow effect."
)]
pub struct Cli {
    /// Main title text
    pub title: Option<String>,

    /// Credits line shown under the title
    #[arg(long)]
    pub subtitle: Option<String>,

    /// Small line shown above the credits
    #[arg(long)]
    pub small_subtitle: Option<String>,

    /// Starting (and largest) title font size in pixels [default: 300]
    #[arg(long, allow_negative_numbers = true)]
    pub title_font_size: Option<i64>,

    /// Subtitle font size in pixels [default: 30]
    #[arg(long, allow_negative_numbers = true)]
    pub subtitle_font_size: Option<i64>,

    /// Title fill color as hex [default: #ebed00]
    #[arg(long)]
    pub color: Option<String>,

    /// Outline color as hex [default: #000000]
    #[arg(long)]
    pub outline_color: Option<String>,

    /// Outline width in pixels, 0 for none [default: 0]
    #[arg(long, allow_negative_numbers = true)]
    pub outline: Option<i64>,

    /// Background image in <assets-dir>/background/, or "none"
    #[arg(long)]
    pub background: Option<String>,

    /// Solid fill used when there is no background image [default: #00008b]
    #[arg(long)]
    pub background_color: Option<String>,

    /// Canvas size as WIDTHxHEIGHT [default: background size, else 1920x1080]
    #[arg(long)]
    pub size: Option<String>,

    /// Title font file in <assets-dir>/fonts/
    #[arg(long)]
    pub title_font: Option<String>,

    /// Subtitle font file in <assets-dir>/fonts/
    #[arg(long)]
    pub subtitle_font: Option<String>,

    /// Directory holding background/ and fonts/ [default: assets]
    #[arg(long)]
    pub assets_dir: Option<PathBuf>,

    /// Perspective tilt in [0, 0.5) [default: 0]
    #[arg(long, allow_negative_numbers = true)]
    pub tilt: Option<f64>,

    /// Effect: none, glitch, distort or shadow [default: none]
    #[arg(long)]
    pub effect: Option<String>,

    /// Seed for the glitch effect [default: random, logged]
    #[arg(long)]
    pub seed: Option<u64>,

    /// Output PNG path [default: derived from the title]
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Draw the subtitle lines
    #[arg(long)]
    pub show_credits: bool,

    /// TOML file with the same options; flags given here win
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Resolve and lay out only; print the result as JSON and write nothing
    #[arg(long)]
    pub dry_run: bool,
}

impl Cli {
    /// The flags as unresolved options. Unset flags stay `None` so an
    /// options file can fill them.
    pub fn raw_options(&self) -> RawOptions {
        RawOptions {
            title: self.title.clone(),
            subtitle: self.subtitle.clone(),
            small_subtitle: self.small_subtitle.clone(),
            title_font_size: self.title_font_size,
            subtitle_font_size: self.subtitle_font_size,
            color: self.color.clone(),
            outline_color: self.outline_color.clone(),
            outline: self.outline,
            background: self.background.clone(),
            background_color: self.background_color.clone(),
            size: self.size.clone(),
            title_font: self.title_font.clone(),
            subtitle_font: self.subtitle_font.clone(),
            assets_dir: self.assets_dir.clone(),
            tilt: self.tilt,
            effect: self.effect.clone(),
            seed: self.seed,
            output: self.output.clone(),
            show_credits: self.show_credits.then_some(true),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_flags_map_to_options() {
        let cli = Cli::try_parse_from([
            "titlecard",
            "Invincible",
            "--outline",
            "4",
            "--effect",
            "glitch",
            "--seed",
            "7",
            "--show-credits",
        ])
        .unwrap();
        let opts = cli.raw_options();
        assert_eq!(opts.title.as_deref(), Some("Invincible"));
        assert_eq!(opts.outline, Some(4));
        assert_eq!(opts.effect.as_deref(), Some("glitch"));
        assert_eq!(opts.seed, Some(7));
        assert_eq!(opts.show_credits, Some(true));
        assert_eq!(opts.color, None);
    }

    #[test]
    fn test_negative_numbers_reach_validation() {
        let cli = Cli::try_parse_from(["titlecard", "X", "--outline", "-1"]).unwrap();
        assert_eq!(cli.raw_options().outline, Some(-1));
    }

    #[test]
    fn test_unset_credits_flag_defers_to_file() {
        let cli = Cli::try_parse_from(["titlecard", "X"]).unwrap();
        assert_eq!(cli.raw_options().show_credits, None);
    }
}
