use ab_glyph::{FontVec, PxScale};
use image::{ImageFormat, ImageResult, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use std::path::Path;

use crate::grid_config::{Choice, GridConfig};

/// Glyph used for cells that can't hold a letter.
pub const BLOCK_GLYPH: char = '█';

/// Glyph used for open cells that no choice has filled.
pub const EMPTY_GLYPH: char = ' ';

/// Side of one cell in a rendered image, in pixels, border included.
pub const CELL_SIZE: u32 = 100;
const CELL_BORDER: u32 = 2;
const LETTER_SCALE: f32 = 80.0;

const BLOCK_COLOR: Rgba<u8> = Rgba([0, 0, 0, 255]);
const CELL_COLOR: Rgba<u8> = Rgba([255, 255, 255, 255]);
const LETTER_COLOR: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Lay a set of choices out on the grid. Blocked cells and unfilled open cells are both `None`;
/// use `GridConfig::is_open` to tell them apart.
pub fn letter_grid(config: &GridConfig, choices: &[Choice]) -> Vec<Vec<Option<char>>> {
    let mut grid: Vec<Vec<Option<char>>> = vec![vec![None; config.width]; config.height];

    for &Choice { slot_id, word_id } in choices {
        let slot = config.slot(slot_id);
        let word = config.word_list.word(word_id);

        for ((row, col), &glyph) in slot.cell_coords().zip(word.glyphs.iter()) {
            grid[row][col] = Some(glyph);
        }
    }

    grid
}

/// Turn the given grid config and fill choices into a multiline string, one line per row.
pub fn render_grid(config: &GridConfig, choices: &[Choice]) -> String {
    letter_grid(config, choices)
        .iter()
        .enumerate()
        .map(|(row, letters)| {
            letters
                .iter()
                .enumerate()
                .map(|(col, letter)| match letter {
                    Some(letter) => *letter,
                    None if config.is_open((row, col)) => EMPTY_GLYPH,
                    None => BLOCK_GLYPH,
                })
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Draw the grid as an image: black background, white open cells and each filled letter centered
/// in its cell. Letters need a font; without one only the cells are drawn.
pub fn render_image(config: &GridConfig, choices: &[Choice], font: Option<&FontVec>) -> RgbaImage {
    let interior_size = CELL_SIZE - 2 * CELL_BORDER;
    let scale = PxScale::from(LETTER_SCALE);
    let mut image = RgbaImage::from_pixel(
        config.width as u32 * CELL_SIZE,
        config.height as u32 * CELL_SIZE,
        BLOCK_COLOR,
    );

    for (row, letters) in letter_grid(config, choices).iter().enumerate() {
        for (col, letter) in letters.iter().enumerate() {
            if !config.is_open((row, col)) {
                continue;
            }

            let x = (col as u32 * CELL_SIZE + CELL_BORDER) as i32;
            let y = (row as u32 * CELL_SIZE + CELL_BORDER) as i32;
            draw_filled_rect_mut(
                &mut image,
                Rect::at(x, y).of_size(interior_size, interior_size),
                CELL_COLOR,
            );

            if let (Some(letter), Some(font)) = (letter, font) {
                let text = letter.to_string();
                let (width, height) = text_size(scale, font, &text);
                draw_text_mut(
                    &mut image,
                    LETTER_COLOR,
                    x + (interior_size as i32 - width as i32) / 2,
                    y + (interior_size as i32 - height as i32) / 2,
                    scale,
                    font,
                    &text,
                );
            }
        }
    }

    image
}

/// Render the grid with `render_image` and write it to `path` as a PNG.
pub fn save_png(
    config: &GridConfig,
    choices: &[Choice],
    font: Option<&FontVec>,
    path: &Path,
) -> ImageResult<()> {
    render_image(config, choices, font).save_with_format(path, ImageFormat::Png)
}

#[cfg(test)]
mod tests {
    use image::Rgba;

    use crate::backtracking_search::find_fill;
    use crate::grid_config::{generate_grid_config_from_template_string, Choice};
    use crate::options::FillOptions;
    use crate::render::{letter_grid, render_grid, render_image, save_png, CELL_SIZE};
    use crate::word_list::WordList;

    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
    const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

    #[test]
    fn test_render_partial_fill() {
        let config = generate_grid_config_from_template_string(
            WordList::new(["CAT", "COB"]),
            "
            ___
            _#_
            ___
            ",
        )
        .unwrap();

        assert_eq!(render_grid(&config, &[]), "   \n █ \n   ");

        // Slot 0 is the top row, slot 2 is the left column.
        let choices = [
            Choice { slot_id: 0, word_id: 0 },
            Choice { slot_id: 2, word_id: 1 },
        ];
        assert_eq!(render_grid(&config, &choices), "CAT\nO█ \nB  ");

        let letters = letter_grid(&config, &choices);
        assert_eq!(letters[1], vec![Some('O'), None, None]);
    }

    #[test]
    fn test_render_found_fill() {
        let config = generate_grid_config_from_template_string(
            WordList::new(["CAT", "BAG"]),
            "
            #_#
            ___
            #_#
            ",
        )
        .unwrap();

        let result = find_fill(&config, &FillOptions::default()).expect("Failed to find a fill");
        let rendered = render_grid(&config, &result.choices);

        assert!(rendered == "█B█\nCAT\n█G█" || rendered == "█C█\nBAG\n█T█");
    }

    /// ___
    /// _#_
    /// ___
    #[test]
    fn test_render_image_colors_cells() {
        let config = generate_grid_config_from_template_string(
            WordList::new(["CAT", "COB"]),
            "
            ___
            _#_
            ___
            ",
        )
        .unwrap();

        let image = render_image(&config, &[], None);
        assert_eq!(image.dimensions(), (3 * CELL_SIZE, 3 * CELL_SIZE));

        // Open cell interiors are white, the blocked center and the borders are black.
        assert_eq!(*image.get_pixel(50, 50), WHITE);
        assert_eq!(*image.get_pixel(250, 150), WHITE);
        assert_eq!(*image.get_pixel(150, 150), BLACK);
        assert_eq!(*image.get_pixel(0, 0), BLACK);
        assert_eq!(*image.get_pixel(99, 50), BLACK);
        assert_eq!(*image.get_pixel(50, 100), BLACK);
    }

    #[test]
    fn test_save_png_writes_readable_image() {
        let config = generate_grid_config_from_template_string(
            WordList::new(["CAT"]),
            "
            ___
            #__
            ",
        )
        .unwrap();
        let choices = [Choice { slot_id: 0, word_id: 0 }];

        let path = std::env::temp_dir().join(format!("crossfill-{}.png", std::process::id()));
        save_png(&config, &choices, None, &path).expect("failed to write png");

        let image = image::open(&path).expect("failed to read png").to_rgba8();
        std::fs::remove_file(&path).ok();

        assert_eq!(image.dimensions(), (3 * CELL_SIZE, 2 * CELL_SIZE));
        assert_eq!(*image.get_pixel(50, 150), BLACK);
        assert_eq!(*image.get_pixel(150, 150), WHITE);
    }
}
