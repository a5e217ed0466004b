use corrdepth::lowlevel::{propagate_2x2, DisparityRanges};
use corrdepth::{DepthMap, DepthMapPair};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_coarse(width: usize, height: usize, max: u8, seed: u64) -> DepthMapPair {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut map = || {
        let data = (0..width * height)
            .map(|_| rng.random_range(0..=max))
            .collect();
        DepthMap::new(data, width, height).unwrap()
    };
    let left = map();
    let right = map();
    DepthMapPair { left, right }
}

#[test]
fn propagated_ranges_never_overread() {
    let (fine_w, fine_h) = (64, 40);
    for (seed, (block_x, block_y, limit)) in [(9, 9, 65u16), (5, 3, 16), (3, 7, 255), (11, 5, 1)]
        .into_iter()
        .enumerate()
    {
        let coarse = random_coarse(fine_w / 2, fine_h / 2, 255, seed as u64);
        let ranges = propagate_2x2(&coarse, fine_w, fine_h, block_x, block_y, limit).unwrap();
        assert_eq!((ranges.width(), ranges.height()), (fine_w, fine_h));
        let (bx_half, by_half) = (block_x / 2, block_y / 2);
        for y in 0..fine_h {
            for x in 0..fine_w {
                let r = ranges.get(x, y);
                let interior = y >= by_half
                    && y < fine_h - by_half
                    && x >= bx_half
                    && x < fine_w - bx_half;
                if !interior {
                    assert_eq!((r.min, r.max), (0, 0));
                    continue;
                }
                assert!(r.min <= r.max, "x={x} y={y} {r:?}");
                assert!(usize::from(r.max) <= x - bx_half, "x={x} y={y} {r:?}");
                assert!(r.max <= limit, "x={x} y={y} {r:?}");
            }
        }
    }
}

#[test]
fn odd_fine_size_reads_inside_coarse_map() {
    // Columns 18 and 19 map to coarse column 9, past the 9-wide coarse map.
    let coarse = random_coarse(9, 8, 6, 17);
    let ranges = propagate_2x2(&coarse, 21, 17, 3, 3, 12).unwrap();
    assert_eq!(ranges.width(), 21);
    for y in 1..16 {
        assert_eq!((ranges.get(18, y).min, ranges.get(18, y).max), (0, 0));
        assert_eq!((ranges.get(19, y).min, ranges.get(19, y).max), (0, 0));
        assert!(ranges.get(17, y).max <= 12);
    }
}

#[test]
fn full_table_matches_left_edge_clip() {
    let ranges = DisparityRanges::full(30, 12, 7, 5, 10).unwrap();
    for y in 2..10 {
        for x in 3..27 {
            let r = ranges.get(x, y);
            assert_eq!(r.min, 0);
            assert_eq!(usize::from(r.max), (x - 3).min(10));
        }
    }
    assert_eq!(ranges.get(2, 5).max, 0);
    assert_eq!(ranges.get(10, 1).max, 0);
}
