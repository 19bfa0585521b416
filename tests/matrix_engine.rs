use xnorpop::collection::Matrices;
use xnorpop::matrix::Matrix;
use xnorpop::parallel::parallel_for;
use xnorpop::sampler::Rng;
use xnorpop::ternary::TernaryMatrix;

fn init_logging() {
    let _: Result<_, _> = tracing_subscriber::fmt().with_test_writer().try_init();
}

#[test]
fn dot_diagonal_equals_row_count_for_identical_rows() {
    init_logging();
    let mut rng = Rng::new_rng_from_global_seed();
    let m = Matrix::random(20, 130, 0, &mut rng).unwrap();
    let dot = m.dot(&m).unwrap();
    for i in 0..20 {
        assert_eq!(dot[i * 20 + i], 130);
    }
}

#[test]
fn ternary_dot_matches_binary_dot_ternary() {
    init_logging();
    let mut rng = Rng::new_rng_from_global_seed();
    let binary = Matrix::random(6, 90, 0, &mut rng).unwrap();
    let ternary = TernaryMatrix::random(8, 90, 0, 0, &mut rng).unwrap();

    let (match_counts, active_counts) = binary
        .dot_ternary(ternary.sign_matrix(), ternary.non_zero_matrix())
        .unwrap();

    let mut as_ternary_binary = TernaryMatrix::ones(6, 90).unwrap();
    for r in 0..6 {
        for c in 0..90 {
            if binary.bit(r, c).unwrap() {
                as_ternary_binary.set_plus(r, c).unwrap();
            } else {
                as_ternary_binary.set_minus(r, c).unwrap();
            }
        }
    }
    let result = as_ternary_binary.dot(&ternary).unwrap();

    for i in 0..6 {
        for j in 0..8 {
            assert_eq!(match_counts[i * 8 + j], result.match_count(i, j));
            assert_eq!(active_counts[i * 8 + j], result.non_zero_count(i, j));
        }
    }
}

#[test]
fn thermometer_matrices_have_monotone_popcount() {
    init_logging();
    let matrices = Matrices::new_thermometer(6, 10, 10).unwrap();
    let counts: Vec<u64> = matrices.as_slice().iter().map(Matrix::ones_count).collect();
    for window in counts.windows(2) {
        assert!(window[1] >= window[0]);
    }
}

#[test]
fn parallel_for_fills_buffer_matching_sequential_loop() {
    init_logging();
    let n = 777usize;
    let mut expected = vec![0u64; n];
    for (i, slot) in expected.iter_mut().enumerate() {
        *slot = (i as u64).wrapping_mul(31).wrapping_add(7);
    }

    let mut actual = vec![0u64; n];
    {
        let actual_cells: Vec<std::sync::atomic::AtomicU64> =
            actual.iter().map(|&v| std::sync::atomic::AtomicU64::new(v)).collect();
        parallel_for::<_, ()>(n as i64, 6, |_worker_id, index| {
            let v = (index as u64).wrapping_mul(31).wrapping_add(7);
            actual_cells[index].store(v, std::sync::atomic::Ordering::Relaxed);
            Ok(())
        })
        .unwrap();
        for (slot, cell) in actual.iter_mut().zip(actual_cells.iter()) {
            *slot = cell.load(std::sync::atomic::Ordering::Relaxed);
        }
    }

    assert_eq!(actual, expected);
}
