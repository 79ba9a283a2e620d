//! RGB colors and the fixed color tables.

use lazy_static::lazy_static;
use rand::{Rng, RngCore};
use rustc_hash::FxHashMap;
use serde_json::Value as Json;

/// An RGB color with 8-bit channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub [u8; 3]);

/// Palette sampled when a color is given as `"random"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Palette {
    /// The 20-color categorical palette.
    Twenty,
    /// Every entry of the named-color table.
    Named,
}

/// The 20-color categorical palette.
pub const COLORS_20: [&str; 20] = [
    "#1f77b4", "#aec7e8", "#ff7f0e", "#ffbb78", "#2ca02c", "#98df8a", "#d62728", "#ff9896",
    "#9467bd", "#c5b0d5", "#8c564b", "#c49c94", "#e377c2", "#f7b6d2", "#7f7f7f", "#c7c7c7",
    "#bcbd22", "#dbdb8d", "#17becf", "#9edae5",
];

/// Named colors, in a fixed order so random sampling is reproducible.
pub const NAMED_COLORS: &[(&str, &str)] = &[
    ("aliceblue", "F0F8FF"), ("antiquewhite", "FAEBD7"), ("aqua", "00FFFF"),
    ("aquamarine", "7FFFD4"), ("azure", "F0FFFF"), ("beige", "F5F5DC"),
    ("bisque", "FFE4C4"), ("black", "000000"), ("blanchedalmond", "FFEBCD"),
    ("blue", "0000FF"), ("blueviolet", "8A2BE2"), ("brown", "A52A2A"),
    ("burlywood", "DEB887"), ("cadetblue", "5F9EA0"), ("chartreuse", "7FFF00"),
    ("chocolate", "D2691E"), ("coral", "FF7F50"), ("cornflowerblue", "6495ED"),
    ("cornsilk", "FFF8DC"), ("crimson", "DC143C"), ("cyan", "00FFFF"),
    ("darkblue", "00008B"), ("darkcyan", "008B8B"), ("darkgoldenrod", "B8860B"),
    ("darkgray", "A9A9A9"), ("darkgrey", "A9A9A9"), ("darkgreen", "006400"),
    ("darkkhaki", "BDB76B"), ("darkmagenta", "8B008B"), ("darkolivegreen", "556B2F"),
    ("darkorange", "FF8C00"), ("darkorchid", "9932CC"), ("darkred", "8B0000"),
    ("darksalmon", "E9967A"), ("darkseagreen", "8FBC8F"), ("darkslateblue", "483D8B"),
    ("darkslategray", "2F4F4F"), ("darkslategrey", "2F4F4F"), ("darkturquoise", "00CED1"),
    ("darkviolet", "9400D3"), ("deeppink", "FF1493"), ("deepskyblue", "00BFFF"),
    ("dimgray", "696969"), ("dimgrey", "696969"), ("dodgerblue", "1E90FF"),
    ("firebrick", "B22222"), ("floralwhite", "FFFAF0"), ("forestgreen", "228B22"),
    ("fuchsia", "FF00FF"), ("gainsboro", "DCDCDC"), ("ghostwhite", "F8F8FF"),
    ("gold", "FFD700"), ("goldenrod", "DAA520"), ("gray", "808080"),
    ("grey", "808080"), ("green", "008000"), ("greenyellow", "ADFF2F"),
    ("honeydew", "F0FFF0"), ("hotpink", "FF69B4"), ("indianred", "CD5C5C"),
    ("indigo", "4B0082"), ("ivory", "FFFFF0"), ("khaki", "F0E68C"),
    ("lavender", "E6E6FA"), ("lavenderblush", "FFF0F5"), ("lawngreen", "7CFC00"),
    ("lemonchiffon", "FFFACD"), ("lightblue", "ADD8E6"), ("lightcoral", "F08080"),
    ("lightcyan", "E0FFFF"), ("lightgoldenrodyellow", "FAFAD2"), ("lightgray", "D3D3D3"),
    ("lightgrey", "D3D3D3"), ("lightgreen", "90EE90"), ("lightpink", "FFB6C1"),
    ("lightsalmon", "FFA07A"), ("lightseagreen", "20B2AA"), ("lightskyblue", "87CEFA"),
    ("lightslategray", "778899"), ("lightslategrey", "778899"), ("lightsteelblue", "B0C4DE"),
    ("lightyellow", "FFFFE0"), ("lime", "00FF00"), ("limegreen", "32CD32"),
    ("linen", "FAF0E6"), ("magenta", "FF00FF"), ("maroon", "800000"),
    ("mediumaquamarine", "66CDAA"), ("mediumblue", "0000CD"), ("mediumorchid", "BA55D3"),
    ("mediumpurple", "9370DB"), ("mediumseagreen", "3CB371"), ("mediumslateblue", "7B68EE"),
    ("mediumspringgreen", "00FA9A"), ("mediumturquoise", "48D1CC"),
    ("mediumvioletred", "C71585"), ("midnightblue", "191970"), ("mintcream", "F5FFFA"),
    ("mistyrose", "FFE4E1"), ("moccasin", "FFE4B5"), ("navajowhite", "FFDEAD"),
    ("navy", "000080"), ("oldlace", "FDF5E6"), ("olive", "808000"),
    ("olivedrab", "6B8E23"), ("orange", "FFA500"), ("orangered", "FF4500"),
    ("orchid", "DA70D6"), ("palegoldenrod", "EEE8AA"), ("palegreen", "98FB98"),
    ("paleturquoise", "AFEEEE"), ("palevioletred", "DB7093"), ("papayawhip", "FFEFD5"),
    ("peachpuff", "FFDAB9"), ("peru", "CD853F"), ("pink", "FFC0CB"),
    ("plum", "DDA0DD"), ("powderblue", "B0E0E6"), ("purple", "800080"),
    ("rebeccapurple", "663399"), ("red", "FF0000"), ("rosybrown", "BC8F8F"),
    ("royalblue", "4169E1"), ("saddlebrown", "8B4513"), ("salmon", "FA8072"),
    ("sandybrown", "F4A460"), ("seagreen", "2E8B57"), ("seashell", "FFF5EE"),
    ("sienna", "A0522D"), ("silver", "C0C0C0"), ("skyblue", "87CEEB"),
    ("slateblue", "6A5ACD"), ("slategray", "708090"), ("slategrey", "708090"),
    ("snow", "FFFAFA"), ("springgreen", "00FF7F"), ("steelblue", "4682B4"),
    ("tan", "D2B48C"), ("teal", "008080"), ("thistle", "D8BFD8"),
    ("tomato", "FF6347"), ("turquoise", "40E0D0"), ("violet", "EE82EE"),
    ("wheat", "F5DEB3"), ("white", "FFFFFF"), ("whitesmoke", "F5F5F5"),
    ("yellow", "FFFF00"), ("yellowgreen", "9ACD32"),
];

lazy_static! {
    static ref NAMED_LOOKUP: FxHashMap<&'static str, &'static str> =
        NAMED_COLORS.iter().copied().collect();
}

const COLOR_HELP: &str =
    "expected RGB with values 0-255, hex color e.g. '#FF0000', a color name, or 'random'";

impl Rgb {
    /// Parses a 6-digit or 3-digit hex color, with or without a leading `#`.
    pub fn from_hex(s: &str) -> Option<Rgb> {
        let hex = s.trim().trim_start_matches('#');
        let expanded: String = match hex.len() {
            3 => hex.chars().flat_map(|c| [c, c]).collect(),
            6 => hex.to_string(),
            _ => return None,
        };
        let mut rgb = [0u8; 3];
        for (i, channel) in rgb.iter_mut().enumerate() {
            *channel = u8::from_str_radix(expanded.get(i * 2..i * 2 + 2)?, 16).ok()?;
        }
        Some(Rgb(rgb))
    }

    /// Looks up a color by name (case-insensitive).
    pub fn named(name: &str) -> Option<Rgb> {
        let key = name.trim().to_ascii_lowercase();
        NAMED_LOOKUP.get(key.as_str()).and_then(|hex| Rgb::from_hex(hex))
    }

    /// Draws a color uniformly from `palette`.
    pub fn random(palette: Palette, rng: &mut dyn RngCore) -> Rgb {
        let hex = match palette {
            Palette::Twenty => COLORS_20[rng.gen_range(0..COLORS_20.len())],
            Palette::Named => NAMED_COLORS[rng.gen_range(0..NAMED_COLORS.len())].1,
        };
        // Both tables hold well-formed hex strings.
        Rgb::from_hex(hex).unwrap_or(Rgb([0, 0, 0]))
    }

    /// Parses a color string: a name, `"random"`, or hex.
    pub fn parse(s: &str, palette: Palette, rng: &mut dyn RngCore) -> Result<Rgb, String> {
        if let Some(rgb) = Rgb::named(s) {
            return Ok(rgb);
        }
        if s.trim().eq_ignore_ascii_case("random") {
            return Ok(Rgb::random(palette, rng));
        }
        Rgb::from_hex(s).ok_or_else(|| format!("`{}` is not a color: {}", s, COLOR_HELP))
    }

    /// Builds a color from integer channels, each of which must be in `[0, 255]`.
    pub fn from_channels(channels: &[i64]) -> Result<Rgb, String> {
        if channels.len() != 3 {
            return Err(format!(
                "color must have 3 channels, found {}: {}",
                channels.len(),
                COLOR_HELP
            ));
        }
        let mut rgb = [0u8; 3];
        for (out, &c) in rgb.iter_mut().zip(channels) {
            *out = u8::try_from(c)
                .map_err(|_| format!("color channel {} outside [0, 255]", c))?;
        }
        Ok(Rgb(rgb))
    }

    /// Uppercase hex form, e.g. `#FF0000`.
    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.0[0], self.0[1], self.0[2])
    }

    /// Wire form: a 3-element integer array.
    pub fn to_json(&self) -> Json {
        Json::from(vec![self.0[0], self.0[1], self.0[2]])
    }
}
