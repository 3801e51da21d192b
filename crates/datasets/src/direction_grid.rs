/// Length in samples of every impulse response in the reference measurement set.
pub const HRIR_LENGTH: usize = 256;

/// Number of measured directions, and therefore the number of valid HRIR ids.
///
/// Ids run from `0` to `HRIR_COUNT - 1` in measurement order.
pub const HRIR_COUNT: usize = 62;

/// Width of one azimuth sector, in degrees.
pub const AZIMUTH_SECTOR_DEGREES: f64 = 30.0;

/// Height of one elevation band, in degrees.
pub const ELEVATION_BAND_DEGREES: f64 = 30.0;

/// Sectors spanning `0..=360` degrees of azimuth.
pub const AZIMUTH_SECTORS: usize = 12;

/// Bands spanning `-90..=90` degrees of elevation.
pub const ELEVATION_BANDS: usize = 6;

/// The lowest elevation the grid covers.  Band 0 starts here.
pub const MIN_ELEVATION: f64 = -90.0;

/// Index of each corner inside a quad from [DIRECTION_GRID].
pub const LOWER_LEFT: usize = 0;
pub const UPPER_LEFT: usize = 1;
pub const LOWER_RIGHT: usize = 2;
pub const UPPER_RIGHT: usize = 3;

/// The four measured directions surrounding each grid cell, as `[lower left, upper left, lower right, upper right]`.
///
/// Indexed as `DIRECTION_GRID[azimuth_sector][elevation_band]`, where sector 0 is `0..30` degrees of azimuth and band
/// 0 is `-90..-60` degrees of elevation.
///
/// Several cells reuse ids across corners (the poles collapse onto ids 2 and 6) and a handful break the pattern of
/// their neighbours, for example `[0][3]` and `[8][3]`.  These come straight from the measurement-to-cell mapping and
/// are kept as-is until they can be checked against the measured set.
pub static DIRECTION_GRID: [[[u16; 4]; ELEVATION_BANDS]; AZIMUTH_SECTORS] = [
    // 0..30
    [
        [2, 1, 2, 8],
        [1, 0, 8, 7],
        [0, 3, 7, 9],
        [59, 60, 9, 10],
        [4, 5, 10, 11],
        [5, 6, 11, 6],
    ],
    // 30..60
    [
        [2, 8, 2, 13],
        [8, 7, 13, 12],
        [7, 9, 12, 14],
        [9, 10, 14, 15],
        [10, 11, 15, 16],
        [11, 6, 16, 6],
    ],
    // 60..90
    [
        [2, 13, 2, 18],
        [13, 12, 18, 17],
        [12, 14, 17, 19],
        [14, 15, 19, 20],
        [15, 16, 20, 21],
        [16, 6, 21, 6],
    ],
    // 90..120
    [
        [2, 18, 2, 28],
        [18, 17, 23, 22],
        [17, 19, 22, 24],
        [19, 20, 24, 25],
        [20, 21, 25, 26],
        [21, 6, 26, 6],
    ],
    // 120..150
    [
        [2, 23, 2, 28],
        [23, 22, 28, 27],
        [22, 24, 27, 29],
        [24, 25, 29, 30],
        [25, 26, 30, 31],
        [26, 6, 31, 6],
    ],
    // 150..180
    [
        [2, 33, 2, 38],
        [28, 27, 33, 32],
        [30, 29, 32, 34],
        [29, 30, 34, 45],
        [30, 31, 35, 36],
        [26, 6, 36, 6],
    ],
    // 180..210
    [
        [2, 38, 2, 38],
        [33, 32, 38, 37],
        [32, 34, 37, 39],
        [34, 35, 39, 40],
        [35, 36, 40, 41],
        [36, 6, 41, 6],
    ],
    // 210..240
    [
        [2, 38, 2, 43],
        [38, 37, 43, 42],
        [37, 39, 42, 44],
        [39, 40, 44, 45],
        [40, 41, 45, 46],
        [41, 6, 46, 6],
    ],
    // 240..270
    [
        [2, 43, 2, 43],
        [43, 42, 48, 47],
        [42, 44, 47, 49],
        [44, 40, 49, 50],
        [45, 46, 50, 51],
        [46, 6, 51, 6],
    ],
    // 270..300
    [
        [2, 48, 2, 53],
        [48, 47, 53, 52],
        [47, 49, 52, 54],
        [49, 50, 54, 55],
        [50, 51, 55, 56],
        [51, 6, 51, 6],
    ],
    // 300..330
    [
        [2, 53, 2, 58],
        [53, 52, 58, 57],
        [52, 54, 57, 59],
        [54, 55, 59, 60],
        [55, 56, 60, 61],
        [56, 6, 61, 6],
    ],
    // 330..360
    [
        [2, 58, 2, 1],
        [58, 57, 1, 0],
        [57, 59, 0, 3],
        [59, 60, 3, 4],
        [60, 61, 4, 5],
        [61, 6, 5, 6],
    ],
];

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn every_id_is_in_the_measurement_set() {
        for (sector, bands) in DIRECTION_GRID.iter().enumerate() {
            for (band, quad) in bands.iter().enumerate() {
                for id in quad {
                    assert!(
                        (*id as usize) < HRIR_COUNT,
                        "cell ({sector}, {band}) references id {id}"
                    );
                }
            }
        }
    }

    #[test]
    fn grid_covers_the_sphere() {
        assert_eq!(
            AZIMUTH_SECTORS as f64 * AZIMUTH_SECTOR_DEGREES,
            360.0
        );
        assert_eq!(ELEVATION_BANDS as f64 * ELEVATION_BAND_DEGREES, 180.0);
    }

    #[test]
    fn poles_collapse_onto_their_ids() {
        // Every cell touching the bottom pole has 2 on both lower corners, the top pole has 6 on both upper corners.
        for bands in DIRECTION_GRID.iter() {
            let bottom = bands[0];
            assert_eq!((bottom[LOWER_LEFT], bottom[LOWER_RIGHT]), (2, 2));

            let top = bands[ELEVATION_BANDS - 1];
            assert_eq!((top[UPPER_LEFT], top[UPPER_RIGHT]), (6, 6));
        }
    }

    #[test]
    fn every_measured_direction_is_reachable() {
        let mut seen = [false; HRIR_COUNT];
        for quad in DIRECTION_GRID.iter().flatten() {
            for id in quad {
                seen[*id as usize] = true;
            }
        }

        let missing = seen
            .iter()
            .enumerate()
            .filter(|(_, s)| !**s)
            .map(|(i, _)| i)
            .collect::<Vec<_>>();
        assert_eq!(missing, Vec::<usize>::new());
    }
}
