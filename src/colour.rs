//! Plate background colour classification.
//!
//! The classifier votes by pixel mass: every pixel is converted to HSV and
//! counted against each colour's fixed inclusive band; the colour with the
//! largest count wins. Ties (including the all-zero case on a crop that hits
//! no band) resolve to the first colour in enumeration order.

use image::RgbImage;
use serde::Serialize;

/// Closed set of plate background colours, in tie-break order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum PlateColor {
    White,
    Yellow,
    Green,
    Red,
}

impl PlateColor {
    pub fn as_str(self) -> &'static str {
        match self {
            PlateColor::White => "White",
            PlateColor::Yellow => "Yellow",
            PlateColor::Green => "Green",
            PlateColor::Red => "Red",
        }
    }
}

/// Vehicle category derived from the plate colour.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum VehicleCategory {
    Private,
    Commercial,
    Electric,
    Temporary,
    /// Defensive default; unreachable while `PlateColor` stays closed.
    Unknown,
}

impl VehicleCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            VehicleCategory::Private => "Private",
            VehicleCategory::Commercial => "Commercial",
            VehicleCategory::Electric => "Electric",
            VehicleCategory::Temporary => "Temporary",
            VehicleCategory::Unknown => "Unknown",
        }
    }
}

/// Maps a plate colour to its vehicle category.
pub fn vehicle_category(colour: PlateColor) -> VehicleCategory {
    match colour {
        PlateColor::White => VehicleCategory::Private,
        PlateColor::Yellow => VehicleCategory::Commercial,
        PlateColor::Green => VehicleCategory::Electric,
        PlateColor::Red => VehicleCategory::Temporary,
    }
}

/// Inclusive HSV band. H is on the OpenCV 0..=180 scale, S and V on 0..=255,
/// so the hand-tuned constants carry over unchanged. No band wraps the hue
/// circle.
struct HsvBand {
    colour: PlateColor,
    lower: (u8, u8, u8),
    upper: (u8, u8, u8),
}

const BANDS: [HsvBand; 4] = [
    HsvBand {
        colour: PlateColor::White,
        lower: (0, 0, 200),
        upper: (180, 40, 255),
    },
    HsvBand {
        colour: PlateColor::Yellow,
        lower: (15, 80, 80),
        upper: (40, 255, 255),
    },
    HsvBand {
        colour: PlateColor::Green,
        lower: (35, 50, 50),
        upper: (85, 255, 255),
    },
    HsvBand {
        colour: PlateColor::Red,
        lower: (0, 70, 50),
        upper: (10, 255, 255),
    },
];

impl HsvBand {
    fn contains(&self, hsv: (u8, u8, u8)) -> bool {
        let (h, s, v) = hsv;
        let (lh, ls, lv) = self.lower;
        let (uh, us, uv) = self.upper;
        (lh..=uh).contains(&h) && (ls..=us).contains(&s) && (lv..=uv).contains(&v)
    }
}

/// Converts one RGB pixel to HSV on the OpenCV scale (H 0..=180, S/V 0..=255).
fn rgb_to_hsv(r: u8, g: u8, b: u8) -> (u8, u8, u8) {
    let rf = r as f32 / 255.0;
    let gf = g as f32 / 255.0;
    let bf = b as f32 / 255.0;
    let max = rf.max(gf).max(bf);
    let min = rf.min(gf).min(bf);
    let delta = max - min;

    let h_deg = if delta == 0.0 {
        0.0
    } else if max == rf {
        60.0 * (((gf - bf) / delta).rem_euclid(6.0))
    } else if max == gf {
        60.0 * ((bf - rf) / delta + 2.0)
    } else {
        60.0 * ((rf - gf) / delta + 4.0)
    };
    let s = if max == 0.0 { 0.0 } else { delta / max };

    (
        (h_deg / 2.0).round() as u8,
        (s * 255.0).round() as u8,
        (max * 255.0).round() as u8,
    )
}

/// Classifies a non-empty plate crop by pixel-mass voting over the fixed
/// bands. Always returns a colour; a crop matching no band yields White via
/// the tie-break.
pub fn classify_colour(plate: &RgbImage) -> PlateColor {
    let mut counts = [0u64; BANDS.len()];
    for pixel in plate.pixels() {
        let hsv = rgb_to_hsv(pixel[0], pixel[1], pixel[2]);
        for (band, count) in BANDS.iter().zip(counts.iter_mut()) {
            if band.contains(hsv) {
                *count += 1;
            }
        }
    }

    let mut best = 0;
    for (i, count) in counts.iter().enumerate() {
        if *count > counts[best] {
            best = i;
        }
    }
    BANDS[best].colour
}
