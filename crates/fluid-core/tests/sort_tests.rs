use fluid_core::config::SimLimits;
use fluid_core::error::SimError;
use fluid_core::grid::GridLayout;
use fluid_core::particle::ParticleSet;
use fluid_core::sort::scan::{PrefixScan, SCAN_BLOCK_SIZE};
use fluid_core::sort::SpatialIndex;
use glam::Vec3;
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const RADIUS: f32 = 0.25;

fn random_particles(count: usize, seed: u64) -> ParticleSet {
    let mut rng = StdRng::seed_from_u64(seed);
    let positions: Vec<Vec3> = (0..count)
        .map(|_| {
            Vec3::new(
                rng.gen_range(-2.0..2.0),
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
            )
        })
        .collect();
    let velocities = (0..count)
        .map(|i| Vec3::new(i as f32, 0.0, 0.0))
        .collect();
    ParticleSet::from_state(positions, velocities)
}

fn index_for(count: usize) -> SpatialIndex {
    let layout = GridLayout::new(Vec3::new(-2.0, -1.0, -1.0), Vec3::new(2.0, 1.0, 1.0), RADIUS).unwrap();
    SpatialIndex::new(layout, count, &SimLimits::default()).unwrap()
}

fn serial_exclusive_scan(data: &[u32]) -> Vec<u32> {
    let mut sum = 0u32;
    data.iter()
        .map(|&v| {
            let out = sum;
            sum += v;
            out
        })
        .collect()
}

#[test]
fn test_scan_matches_serial_across_levels() {
    for len in [1, 7, SCAN_BLOCK_SIZE, SCAN_BLOCK_SIZE + 1, 3 * SCAN_BLOCK_SIZE + 17, SCAN_BLOCK_SIZE * SCAN_BLOCK_SIZE + 5] {
        let input: Vec<u32> = (0..len).map(|i| (i % 13) as u32).collect();
        let mut data = input.clone();
        let mut scan = PrefixScan::new(len).unwrap();
        scan.exclusive_scan(&mut data);
        assert_eq!(data, serial_exclusive_scan(&input), "length {}", len);
    }
}

#[test]
fn test_scan_reusable_between_calls() {
    let mut scan = PrefixScan::new(1000).unwrap();
    let mut a = vec![1u32; 1000];
    scan.exclusive_scan(&mut a);
    let mut b = vec![2u32; 1000];
    scan.exclusive_scan(&mut b);
    assert_eq!(b[999], 1998);
    assert_eq!(a[999], 999);
}

proptest! {
    #[test]
    fn prop_scan_matches_serial(input in prop::collection::vec(0u32..1000, 0..5000)) {
        let mut data = input.clone();
        let mut scan = PrefixScan::new(input.len()).unwrap();
        scan.exclusive_scan(&mut data);
        prop_assert_eq!(data, serial_exclusive_scan(&input));
    }
}

#[test]
fn test_cell_start_partitions_particles() {
    let mut particles = random_particles(2000, 1);
    let mut index = index_for(2000);
    index.rebuild(&mut particles);

    let layout = *index.layout();
    let starts = index.cell_start();
    assert_eq!(starts[0], 0);
    assert_eq!(*starts.last().unwrap(), 2000);
    assert!(starts.windows(2).all(|w| w[0] <= w[1]));

    for cell in 0..layout.total_cells() as u32 {
        for s in index.cell_range(cell) {
            assert_eq!(layout.cell_index(particles.predicted[s]), cell);
        }
    }
}

#[test]
fn test_ranks_are_dense_within_cells() {
    let mut particles = random_particles(500, 2);
    let mut index = index_for(500);
    index.rebuild(&mut particles);

    let cells = index.layout().total_cells();
    let mut seen = vec![Vec::new(); cells];
    for (key, rank) in index.keys().iter().zip(index.ranks()) {
        seen[*key as usize].push(*rank);
    }
    for (cell, ranks) in seen.iter_mut().enumerate() {
        ranks.sort_unstable();
        let expected: Vec<u32> = (0..ranks.len() as u32).collect();
        assert_eq!(*ranks, expected, "cell {}", cell);
    }
}

#[test]
fn test_scatter_writes_a_permutation() {
    let mut particles = random_particles(1500, 3);
    let original = particles.position.clone();
    let original_vel = particles.velocity.clone();
    let mut index = index_for(1500);
    index.rebuild(&mut particles);

    let perm = index.permutation();
    let mut sorted_perm = perm.clone();
    sorted_perm.sort_unstable();
    assert_eq!(sorted_perm, (0..1500).collect::<Vec<u32>>());

    let dest = index.destinations();
    for (slot, &old) in perm.iter().enumerate() {
        assert_eq!(dest[old as usize] as usize, slot);
        assert_eq!(particles.position[slot], original[old as usize]);
        assert_eq!(particles.velocity[slot], original_vel[old as usize]);
    }
}

fn bits(v: &[Vec3]) -> Vec<[u32; 3]> {
    v.iter().map(|p| [p.x.to_bits(), p.y.to_bits(), p.z.to_bits()]).collect()
}

#[test]
fn test_rebuild_on_sorted_data_keeps_cell_order() {
    let mut particles = random_particles(2000, 4);
    let mut index = index_for(2000);
    index.rebuild(&mut particles);
    let position = particles.position.clone();
    let predicted = particles.predicted.clone();
    let velocity = particles.velocity.clone();

    index.rebuild(&mut particles);

    // Keys of the second pass were computed on already sorted particles
    assert!(index.keys().windows(2).all(|w| w[0] <= w[1]));

    // Every cell holds the same particles as before
    for cell in 0..index.layout().total_cells() as u32 {
        let range = index.cell_range(cell);
        let mut before = bits(&position[range.clone()]);
        let mut after = bits(&particles.position[range]);
        before.sort_unstable();
        after.sort_unstable();
        assert_eq!(before, after, "cell {}", cell);
    }

    // Sequential ranks follow index order, so the second sort is the identity
    if cfg!(not(feature = "parallel")) {
        assert_eq!(index.permutation(), (0..2000).collect::<Vec<u32>>());
        assert_eq!(bits(&particles.position), bits(&position));
        assert_eq!(bits(&particles.predicted), bits(&predicted));
        assert_eq!(bits(&particles.velocity), bits(&velocity));
    }
}

#[test]
fn test_resorting_single_occupancy_cells_is_identity() {
    // One particle per cell: every rank is zero in any execution mode
    let mut positions = Vec::new();
    for z in 0..8 {
        for y in 0..8 {
            for x in (0..16).rev() {
                positions.push(Vec3::new(-2.0, -1.0, -1.0) + (Vec3::new(x as f32, y as f32, z as f32) + 0.5) * RADIUS);
            }
        }
    }
    let count = positions.len();
    let velocities = (0..count).map(|i| Vec3::new(0.0, i as f32, 0.0)).collect();
    let mut particles = ParticleSet::from_state(positions, velocities);
    let mut index = index_for(count);

    index.rebuild(&mut particles);
    assert_ne!(index.permutation(), (0..count as u32).collect::<Vec<u32>>());
    let position = bits(&particles.position);
    let predicted = bits(&particles.predicted);
    let velocity = bits(&particles.velocity);

    index.rebuild(&mut particles);
    assert_eq!(index.permutation(), (0..count as u32).collect::<Vec<u32>>());
    assert_eq!(bits(&particles.position), position);
    assert_eq!(bits(&particles.predicted), predicted);
    assert_eq!(bits(&particles.velocity), velocity);
}

#[test]
fn test_neighbour_strips_match_brute_force() {
    let mut particles = random_particles(800, 5);
    let mut index = index_for(800);
    index.rebuild(&mut particles);

    let sqr_radius = RADIUS * RADIUS;
    for i in 0..particles.count {
        let pos = particles.predicted[i];
        let mut brute: Vec<usize> = (0..particles.count)
            .filter(|&j| (particles.predicted[j] - pos).length_squared() <= sqr_radius)
            .collect();

        let mut found = Vec::new();
        index.for_each_candidate(pos, |j| {
            if (particles.predicted[j] - pos).length_squared() <= sqr_radius {
                found.push(j);
            }
        });

        brute.sort_unstable();
        found.sort_unstable();
        assert_eq!(found, brute, "particle {}", i);
    }
}

#[test]
fn test_out_of_bounds_particles_still_sorted() {
    let positions = vec![
        Vec3::new(50.0, 0.0, 0.0),
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::splat(f32::NAN),
        Vec3::new(-50.0, -50.0, -50.0),
    ];
    let mut particles = ParticleSet::from_state(positions, vec![Vec3::ZERO; 4]);
    let mut index = index_for(4);
    index.rebuild(&mut particles);

    assert_eq!(*index.cell_start().last().unwrap(), 4);
    let mut perm = index.permutation();
    perm.sort_unstable();
    assert_eq!(perm, vec![0, 1, 2, 3]);
}

#[test]
fn test_empty_particle_set() {
    let mut particles = ParticleSet::new(0);
    let mut index = index_for(0);
    index.rebuild(&mut particles);
    assert!(index.cell_start().iter().all(|&s| s == 0));
    assert_eq!(index.max_cell_occupancy(), 0);
}

#[test]
fn test_max_cell_occupancy() {
    let positions = vec![Vec3::new(0.01, 0.01, 0.01); 5]
        .into_iter()
        .chain([Vec3::new(1.5, 0.5, 0.5)])
        .collect::<Vec<_>>();
    let mut particles = ParticleSet::from_state(positions, vec![Vec3::ZERO; 6]);
    let mut index = index_for(6);
    index.rebuild(&mut particles);
    assert_eq!(index.max_cell_occupancy(), 5);
}

#[test]
fn test_buffer_limit_enforced() {
    let layout = GridLayout::new(Vec3::splat(-1.0), Vec3::ONE, 0.5).unwrap();
    let limits = SimLimits { max_buffer_bytes: 1024 };
    let err = SpatialIndex::new(layout, 1000, &limits).err().unwrap();
    assert!(matches!(err, SimError::BufferTooLarge { .. }), "{}", err);
}
