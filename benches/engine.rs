use criterion::{black_box, criterion_group, criterion_main, Criterion};
use duotris::core::{can_place, ActivePiece, Board, GameSession, Pose};
use duotris::types::{GameMode, Key, PieceKind, SPAWN_X};

fn bench_tick(c: &mut Criterion) {
    let mut session = GameSession::new(GameMode::Endless, 12345, 0, 0);

    c.bench_function("session_tick", |b| {
        b.iter(|| {
            session.tick(black_box(None));
            if session.status().is_terminal() {
                session = GameSession::new(GameMode::Endless, 12345, 0, 0);
            }
        })
    });
}

fn bench_soft_drop_run(c: &mut Criterion) {
    c.bench_function("soft_drop_to_lock", |b| {
        b.iter(|| {
            let mut session = GameSession::new(GameMode::Endless, 777, 0, 0);
            for _ in 0..20 {
                session.tick(black_box(Some(Key::SoftDrop)));
            }
            black_box(session.score())
        })
    });
}

fn bench_scan_and_collapse(c: &mut Criterion) {
    c.bench_function("scan_and_collapse_4_rows", |b| {
        b.iter(|| {
            let mut board = Board::new();
            for y in 14..18i8 {
                for x in 0..10 {
                    board.set(x, y, Some(PieceKind::I));
                }
            }
            let rows = board.scan_complete_rows();
            for &row in &rows {
                board.collapse_row(row);
            }
            black_box(board.stack_height())
        })
    });
}

fn bench_can_place(c: &mut Criterion) {
    let board = Board::new();
    let pose = Pose {
        kind: PieceKind::T,
        orientation: 0,
        x: SPAWN_X,
        y: 8,
    };

    c.bench_function("can_place", |b| {
        b.iter(|| black_box(can_place(black_box(&board), black_box(pose))))
    });
}

fn bench_shift(c: &mut Criterion) {
    let board = Board::new();
    let mut piece = ActivePiece::new(PieceKind::L);

    c.bench_function("shift", |b| {
        b.iter(|| {
            piece.shift(&board, black_box(1));
            piece.shift(&board, black_box(-1));
        })
    });
}

criterion_group!(
    benches,
    bench_tick,
    bench_soft_drop_run,
    bench_scan_and_collapse,
    bench_can_place,
    bench_shift
);
criterion_main!(benches);
