use criterion::{criterion_group, criterion_main, Criterion};
use docmodel::{EagerLineIndex, LazyLineIndex, LineIndexState, LineIndexStrategy};

const LINES: u64 = 20_000;

fn seed_text() -> String {
    let mut s = String::with_capacity((LINES as usize) * 8);
    for i in 0..LINES {
        s.push_str(&format!("line {i}\n"));
    }
    s
}

fn eager_insert(c: &mut Criterion) {
    c.bench_function("eager_insert_line_at_midpoint", |bench| {
        let base = LineIndexState::from_text(&seed_text());
        let mid = base.get_line_start_offset(LINES / 2).unwrap();
        let mut version = 1u64;
        bench.iter(|| {
            version += 1;
            let _ = EagerLineIndex.insert(&base, mid, "inserted\n", version);
        });
    });
}

fn lazy_insert(c: &mut Criterion) {
    c.bench_function("lazy_insert_line_at_midpoint", |bench| {
        let base = LineIndexState::from_text(&seed_text());
        let mid = base.get_line_start_offset(LINES / 2).unwrap();
        let mut version = 1u64;
        bench.iter(|| {
            version += 1;
            let _ = LazyLineIndex.insert(&base, mid, "inserted\n", version);
        });
    });
}

fn eager_delete(c: &mut Criterion) {
    c.bench_function("eager_delete_line_at_midpoint", |bench| {
        let base = LineIndexState::from_text(&seed_text());
        let start = base.get_line_start_offset(LINES / 2).unwrap();
        let end = base.get_line_range(LINES / 2).unwrap().end;
        let mut version = 1u64;
        bench.iter(|| {
            version += 1;
            let _ = EagerLineIndex.delete(&base, start, end, version);
        });
    });
}

fn find_line_at_position(c: &mut Criterion) {
    c.bench_function("find_line_at_position_midpoint", |bench| {
        let base = LineIndexState::from_text(&seed_text());
        let mid_offset = base.get_line_start_offset(LINES / 2).unwrap();
        bench.iter(|| {
            let _ = base.find_line_at_position(mid_offset);
        });
    });
}

fn reconcile_full_pass(c: &mut Criterion) {
    c.bench_function("reconcile_full_after_many_lazy_edits", |bench| {
        bench.iter_batched(
            || {
                let mut state = LineIndexState::from_text(&seed_text());
                for i in 0..200 {
                    let at = state.get_line_start_offset((i % LINES).max(1) - 1).unwrap();
                    state = LazyLineIndex.insert(&state, at, "x\n", i as u64);
                }
                state
            },
            |state| {
                let _ = docmodel::reconcile_full(&state, u64::MAX);
            },
            criterion::BatchSize::SmallInput,
        );
    });
}

criterion_group!(
    benches,
    eager_insert,
    lazy_insert,
    eager_delete,
    find_line_at_position,
    reconcile_full_pass
);
criterion_main!(benches);
