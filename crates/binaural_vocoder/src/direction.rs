//! Mapping a direction onto the four measured HRIRs around it.
use binaural_vocoder_datasets::{
    AZIMUTH_SECTORS, AZIMUTH_SECTOR_DEGREES, DIRECTION_GRID, ELEVATION_BANDS, ELEVATION_BAND_DEGREES,
    LOWER_LEFT, LOWER_RIGHT, MIN_ELEVATION, UPPER_LEFT, UPPER_RIGHT,
};

/// The ids of the four measured directions at the corners of a grid cell.
///
/// Left and right are in azimuth order, lower and upper in elevation order.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct DirectionQuad {
    pub lower_left: usize,
    pub upper_left: usize,
    pub lower_right: usize,
    pub upper_right: usize,
}

impl DirectionQuad {
    fn from_cell(cell: &[u16; 4]) -> DirectionQuad {
        DirectionQuad {
            lower_left: cell[LOWER_LEFT] as usize,
            upper_left: cell[UPPER_LEFT] as usize,
            lower_right: cell[LOWER_RIGHT] as usize,
            upper_right: cell[UPPER_RIGHT] as usize,
        }
    }

    /// The ids as `[lower left, upper left, lower right, upper right]`.
    pub fn ids(&self) -> [usize; 4] {
        [
            self.lower_left,
            self.upper_left,
            self.lower_right,
            self.upper_right,
        ]
    }
}

/// Index of the `width`-wide bin `value` falls in, out of `count` bins starting at 0.
///
/// Bins include their lower edge and exclude their upper one, except the last, which includes both.  Anything below
/// the first bin (NaN included) lands in it, anything above the last lands in that.
#[inline(always)]
fn bin(value: f64, width: f64, count: usize) -> usize {
    if !(value >= 0.0) {
        return 0;
    }

    // Float to int casts saturate, so huge values are fine.
    ((value / width) as usize).min(count - 1)
}

/// Select the cell for an azimuth in degrees (`[0, 360]`, clockwise from straight ahead) and an elevation in degrees
/// (`[-90, 90]`).
pub fn select_degrees(azimuth_degrees: f64, elevation: f64) -> DirectionQuad {
    let sector = bin(azimuth_degrees, AZIMUTH_SECTOR_DEGREES, AZIMUTH_SECTORS);
    let band = bin(
        elevation - MIN_ELEVATION,
        ELEVATION_BAND_DEGREES,
        ELEVATION_BANDS,
    );
    DirectionQuad::from_cell(&DIRECTION_GRID[sector][band])
}

/// Select the cell for an azimuth in radians (`(-pi, pi]`, positive to the right) and an elevation in degrees.
///
/// Negative azimuths continue past 180 degrees, so `-pi/2` is 270 degrees.
pub fn select(azimuth: f64, elevation: f64) -> DirectionQuad {
    select_degrees(azimuth_to_degrees(azimuth), elevation)
}

/// Unwrap an azimuth in radians onto `[0, 360)` degrees.
pub fn azimuth_to_degrees(azimuth: f64) -> f64 {
    azimuth.to_degrees().rem_euclid(360.0)
}
