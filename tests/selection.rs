use approx::assert_relative_eq;
use ndcore::{
    argsort, choose, compress, count_nonzero, diagonal, lexsort, nonzero, put, repeat,
    searchsorted, sort, take, Array, ClipMode, SearchSide, SelectError, SortKind,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn ints(v: &[i64]) -> Array {
    Array::from_slice(v).unwrap()
}

fn values(a: &Array) -> Vec<i64> {
    a.to_vec::<i64>().unwrap()
}

#[test]
fn test_take_example() {
    let r = take(&ints(&[10, 20, 30]), &ints(&[2, 0, 1]), Some(0), None, ClipMode::Raise).unwrap();
    assert_eq!(values(&r), vec![30, 10, 20]);
}

#[test]
fn test_clip_modes_agree_across_take_and_put() {
    let a = ints(&[10, 20, 30]);
    let pick = |i: i64, mode| take(&a, &ints(&[i]), Some(0), None, mode).map(|r| values(&r));
    assert!(matches!(
        pick(5, ClipMode::Raise),
        Err(SelectError::IndexOutOfRange(_))
    ));
    assert_eq!(pick(5, ClipMode::Wrap).unwrap(), vec![30]);
    assert_eq!(pick(5, ClipMode::Clip).unwrap(), vec![30]);
    assert_eq!(pick(-1, ClipMode::Wrap).unwrap(), vec![30]);
    assert_eq!(pick(-1, ClipMode::Clip).unwrap(), vec![10]);

    let mut b = a.clone();
    put(&mut b, &ints(&[0]), &ints(&[5]), ClipMode::Wrap).unwrap();
    assert_eq!(values(&b), vec![10, 20, 0]);
    assert_eq!(values(&a), vec![10, 20, 30]);
}

#[test]
fn test_repeat_counts_sum_to_axis_length() {
    let r = repeat(&ints(&[1, 2, 3]), &ints(&[2, 0, 1]), Some(0)).unwrap();
    assert_eq!(values(&r), vec![1, 1, 3]);

    let mut rng = StdRng::seed_from_u64(5);
    let counts: Vec<i64> = (0..4).map(|_| rng.gen_range(0..4)).collect();
    let a = Array::from_vec((0..12i64).collect(), &[3, 4]).unwrap();
    let r = repeat(&a, &ints(&counts), Some(1)).unwrap();
    assert_eq!(r.dims(), &[3, counts.iter().sum::<i64>() as usize]);
}

#[test]
fn test_argsort_then_take_is_sorted_copy() {
    let mut rng = StdRng::seed_from_u64(2024);
    let data: Vec<f64> = (0..500).map(|_| rng.gen_range(-1.0..1.0)).collect();
    let a = Array::from_slice(&data).unwrap();
    for kind in SortKind::ALL {
        let order = argsort(&a, 0, kind).unwrap();
        let mut perm = values(&order);
        let gathered = take(&a, &order, Some(0), None, ClipMode::Raise).unwrap();
        let mut sorted = a.clone();
        sort(&mut sorted, 0, kind).unwrap();
        let (g, s) = (gathered.to_vec::<f64>().unwrap(), sorted.to_vec::<f64>().unwrap());
        for (x, y) in g.iter().zip(&s) {
            assert_relative_eq!(*x, *y);
        }
        assert!(s.windows(2).all(|w| w[0] <= w[1]));
        perm.sort_unstable();
        assert_eq!(perm, (0..500).collect::<Vec<i64>>());
    }
}

#[test]
fn test_sort_of_a_view_leaves_the_source_alone() {
    let a = Array::from_vec(vec![3i32, 2, 1, 6, 5, 4], &[2, 3]).unwrap();
    let mut t = a.permute(&[1, 0]).unwrap();
    sort(&mut t, 0, SortKind::Quicksort).unwrap();
    assert_eq!(t.to_vec::<i32>().unwrap(), vec![1, 4, 2, 5, 3, 6]);
    assert_eq!(a.to_vec::<i32>().unwrap(), vec![3, 2, 1, 6, 5, 4]);
}

#[test]
fn test_lexsort_matches_tuple_sort() {
    let mut rng = StdRng::seed_from_u64(99);
    let primary: Vec<i64> = (0..64).map(|_| rng.gen_range(0..4)).collect();
    let secondary: Vec<i64> = (0..64).map(|_| rng.gen_range(0..4)).collect();
    let idx = lexsort(&[ints(&secondary), ints(&primary)], 0).unwrap();
    let mut expected: Vec<i64> = (0..64).collect();
    expected.sort_by_key(|&i| (primary[i as usize], secondary[i as usize]));
    assert_eq!(values(&idx), expected);
}

#[test]
fn test_searchsorted_example() {
    let a = ints(&[1, 3, 3, 5]);
    let keys = ints(&[3, 0, 6]);
    assert_eq!(values(&searchsorted(&a, &keys, SearchSide::Left).unwrap()), vec![1, 0, 4]);
    assert_eq!(values(&searchsorted(&a, &keys, SearchSide::Right).unwrap()), vec![3, 0, 4]);
}

#[test]
fn test_nonzero_agrees_with_count() {
    let a = ints(&[0, 5, 0, 7]);
    assert_eq!(count_nonzero(&a).unwrap(), 2);
    let nz = nonzero(&a).unwrap();
    assert_eq!(nz.len(), 1);
    assert_eq!(values(&nz[0]), vec![1, 3]);

    let mut rng = StdRng::seed_from_u64(17);
    let bits: Vec<u8> = (0..120).map(|_| rng.gen_range(0..2)).collect();
    let m = Array::from_vec(bits, &[4, 5, 6]).unwrap();
    let n = count_nonzero(&m).unwrap();
    for coords in nonzero(&m).unwrap() {
        assert_eq!(coords.len(), n);
    }
}

#[test]
fn test_choose_compress_and_diagonal() {
    let picked = choose(
        &ints(&[1, 0, 1]),
        &[ints(&[1, 2, 3]), ints(&[-1, -2, -3])],
        None,
        ClipMode::Raise,
    )
    .unwrap();
    assert_eq!(values(&picked), vec![-1, 2, -3]);

    let m = Array::from_vec((0..16i64).collect(), &[4, 4]).unwrap();
    let d = diagonal(&m, 0, 0, 1).unwrap();
    assert_eq!(values(&d), vec![0, 5, 10, 15]);
    let even = Array::from_slice(&[true, false, true, false]).unwrap();
    assert_eq!(values(&compress(&d, &even, Some(0), None).unwrap()), vec![0, 10]);
}
