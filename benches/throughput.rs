use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

use modelctl::{
    core::journal::Journal,
    ctrl::facade::ControllerFacade,
    entity::ClassifierRecord,
    entry::JournalEntry,
    persist::sqlite::SqliteStore,
    stats::Statistics,
    types::{BoundaryPolicy, ClassifierType},
};

fn seeded(n: usize) -> ControllerFacade<SqliteStore> {
    let mut f = ControllerFacade::new(SqliteStore::open_in_memory().expect("open"));
    for i in 0..n {
        f.classifiers()
            .create_classifier(
                ClassifierRecord::new(ClassifierType::Class, format!("C{i}")),
                BoundaryPolicy::StartNew,
            )
            .expect("create");
    }
    f
}

fn bench_journal_append(c: &mut Criterion) {
    c.bench_function("journal_append_100k_wrapping", |b| {
        b.iter(|| {
            let mut journal = Journal::with_capacity(512);
            for i in 0..100_000u32 {
                let policy = if i % 4 == 0 { BoundaryPolicy::StartNew } else { BoundaryPolicy::Append };
                journal.append(JournalEntry::Boundary, policy);
            }
        });
    });
}

fn bench_create_update(c: &mut Criterion) {
    c.bench_function("create_update_1k", |b| {
        b.iter(|| {
            let mut f = seeded(1_000);
            for id in 1..=1_000i64 {
                f.classifiers().update_classifier_x_order(id, 10).expect("update");
            }
        });
    });
}

fn bench_undo_redo(c: &mut Criterion) {
    let mut group = c.benchmark_group("undo_redo_cycle");
    for n in [10usize, 100usize, 400usize] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            let mut f = seeded(n);
            b.iter(|| {
                let mut stats = Statistics::new();
                for _ in 0..n {
                    f.undo(&mut stats).expect("undo");
                }
                for _ in 0..n {
                    f.redo(&mut stats).expect("redo");
                }
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_journal_append, bench_create_update, bench_undo_redo);
criterion_main!(benches);
