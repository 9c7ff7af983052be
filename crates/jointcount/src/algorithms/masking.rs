use std::collections::BTreeSet;

use crate::types::{BinaryMask, LabelCode, LabelRaster};

/// Marks every pixel whose class code is in `codes`.
pub fn build_mask(codes: &BTreeSet<LabelCode>, raster: &LabelRaster) -> BinaryMask {
    BinaryMask::new(raster.mapv(|code| codes.contains(&code)))
}

/// Single-label shortcut for [`build_mask`].
pub fn build_label_mask(code: LabelCode, raster: &LabelRaster) -> BinaryMask {
    BinaryMask::new(raster.mapv(|value| value == code))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_mask_matches_code_membership() {
        let raster: LabelRaster = array![[4, 9, 2], [17, 4, 0]];
        let mask = build_mask(&BTreeSet::from([4, 17]), &raster);
        assert_eq!(
            mask.as_array(),
            &array![[true, false, false], [true, true, false]]
        );
        assert_eq!(mask.count(), 3);
    }

    #[test]
    fn test_empty_code_set_gives_blank_mask() {
        let raster: LabelRaster = array![[1, 2], [3, 4]];
        let mask = build_mask(&BTreeSet::new(), &raster);
        assert!(mask.is_blank());
        assert_eq!(mask.dim(), (2, 2));
    }

    #[test]
    fn test_label_mask() {
        let raster: LabelRaster = array![[1, 2], [2, 2]];
        assert_eq!(build_label_mask(2, &raster).count(), 3);
        assert_eq!(build_label_mask(7, &raster).count(), 0);
    }
}
