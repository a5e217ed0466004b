use corrdepth::lowlevel::{consistency_check, fill_holes, postprocess, rescale_disparity};
use corrdepth::{DepthMap, DepthMapPair};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_pair(width: usize, height: usize, limit: u8, seed: u64) -> DepthMapPair {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut map = || {
        let data = (0..width * height)
            .map(|_| rng.random_range(0..=limit))
            .collect();
        DepthMap::new(data, width, height).unwrap()
    };
    let left = map();
    let right = map();
    DepthMapPair { left, right }
}

#[test]
fn accepted_pixels_are_exactly_the_consistent_ones() {
    let (width, height, limit) = (37, 19, 12u8);
    for seed in 0..8 {
        let pair = random_pair(width, height, limit, seed);
        let out = consistency_check(&pair, u16::from(limit)).unwrap();
        for y in 0..height {
            for x in 0..width {
                let l = pair.left.at(x, y);
                let consistent = x >= usize::from(l)
                    && pair.right.at(x - usize::from(l), y).abs_diff(l) <= 1;
                let expected = if consistent {
                    rescale_disparity(l, u16::from(limit))
                } else {
                    0
                };
                assert_eq!(out.at(x, y), expected, "seed={seed} x={x} y={y}");
            }
        }
    }
}

#[test]
fn consistency_rejects_mismatched_maps() {
    let left = DepthMap::new(vec![0; 12], 4, 3).unwrap();
    let right = DepthMap::new(vec![0; 12], 3, 4).unwrap();
    assert!(consistency_check(&DepthMapPair { left, right }, 8).is_err());
}

#[test]
fn fill_pass_leaves_no_zero_beside_a_value() {
    let (width, height) = (24, 16);
    let mut rng = StdRng::seed_from_u64(99);
    let data: Vec<u8> = (0..width * height)
        .map(|_| {
            if rng.random_bool(0.4) {
                rng.random_range(1..=255u8)
            } else {
                0
            }
        })
        .collect();
    let input = DepthMap::new(data, width, height).unwrap();
    let out = fill_holes(input.clone(), 1).unwrap();

    for y in 0..height {
        for x in 0..width {
            let before = input.at(x, y);
            let after = out.at(x, y);
            let border = x == 0 || y == 0 || x == width - 1 || y == height - 1;
            if before != 0 || border {
                assert_eq!(after, before, "x={x} y={y}");
                continue;
            }
            let neighbors = [
                input.at(x - 1, y),
                input.at(x + 1, y),
                input.at(x, y - 1),
                input.at(x, y + 1),
            ];
            let nonzero: Vec<u32> = neighbors
                .iter()
                .filter(|&&v| v != 0)
                .map(|&v| u32::from(v))
                .collect();
            if nonzero.is_empty() {
                assert_eq!(after, 0);
            } else {
                let n = nonzero.len() as u32;
                let avg = (nonzero.iter().sum::<u32>() + n / 2) / n;
                assert_eq!(u32::from(after), avg, "x={x} y={y}");
                assert_ne!(after, 0);
            }
        }
    }
}

#[test]
fn postprocess_composes_check_and_fill() {
    let pair = random_pair(20, 12, 9, 3);
    let composed = postprocess(&pair, 9, 2).unwrap();
    let manual = fill_holes(consistency_check(&pair, 9).unwrap(), 2).unwrap();
    assert_eq!(composed, manual);
}
