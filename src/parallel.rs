//! # Parallel モジュール
//!
//! 位置更新フェーズの並列実行を担当します。
//!
//! 固定数のワーカーを持つスレッドプールに、連続したオブジェクト範囲（チャンク）を
//! 1つずつタスクとして投入し、全チャンクの完了を待ってから戻ります。
//! 各タスクは自分のチャンクの位置だけを書き換え、位置は「自身の経路と時刻」だけから
//! 決まるため、ワーカー数やチャンクサイズによらず結果はビット単位で一致します。

use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::debug;

use crate::error::SimError;
use crate::models::{entity::Entity, traits::IMovable};

/// チャンク単位で位置を並列更新するワーカープール
pub struct PositionUpdater {
    pool: ThreadPool,
    chunk_size: usize,
}

impl PositionUpdater {
    /// ワーカー数とチャンクサイズを指定して作成
    ///
    /// どちらも1以上である必要があります。
    pub fn new(worker_count: usize, chunk_size: usize) -> Result<Self, SimError> {
        if worker_count == 0 {
            return Err(SimError::Config("worker count must be at least 1".to_string()));
        }
        if chunk_size == 0 {
            return Err(SimError::Config("chunk size must be at least 1".to_string()));
        }

        let pool = ThreadPoolBuilder::new()
            .num_threads(worker_count)
            .thread_name(|i| format!("position-worker-{i}"))
            .build()?;

        debug!(worker_count, chunk_size, "位置更新ワーカープールを作成");

        Ok(Self { pool, chunk_size })
    }

    pub fn worker_count(&self) -> usize {
        self.pool.current_num_threads()
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// 全オブジェクトの位置を指定時刻へ更新
    ///
    /// 全チャンクの処理が終わるまで戻りません。
    pub fn update(&self, entities: &mut [Entity], time_sec: f64) {
        if entities.is_empty() {
            return;
        }

        let chunk_size = self.chunk_size;
        self.pool.scope(|scope| {
            for chunk in entities.chunks_mut(chunk_size) {
                scope.spawn(move |_| {
                    for entity in chunk {
                        entity.update_position(time_sec);
                    }
                });
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::common::Role;
    use crate::models::route::{Route, RoutePoint};

    fn entities(count: usize) -> Vec<Entity> {
        (0..count)
            .map(|i| {
                let lat = 30.0 + (i % 50) as f64 * 0.1;
                let lon = 130.0 + (i / 50) as f64 * 0.1;
                let route = Route::new(vec![
                    RoutePoint::new(lat, lon, 0.0, 20.0 + (i % 7) as f64 * 10.0),
                    RoutePoint::new(lat + 0.05, lon - 0.03, 100.0, 40.0),
                    RoutePoint::new(lat + 0.08, lon + 0.02, 0.0, 0.0),
                ]);
                let role = Role::ALL[i % 4];
                let start_time_sec = (i % 11) as f64 * 30.0;
                Entity::new(format!("E{i}"), format!("T{}", i % 3), role, start_time_sec, route)
            })
            .collect()
    }

    #[test]
    fn test_rejects_zero_sizes() {
        assert!(PositionUpdater::new(0, 64).is_err());
        assert!(PositionUpdater::new(2, 0).is_err());
    }

    #[test]
    fn test_matches_sequential_update() {
        let time_sec = 1_234.0;
        let mut expected = entities(300);
        for e in expected.iter_mut() {
            e.update_position(time_sec);
        }

        let updater = PositionUpdater::new(3, 64).unwrap();
        let mut actual = entities(300);
        updater.update(&mut actual, time_sec);

        let expected: Vec<_> = expected.iter().map(|e| e.position).collect();
        let actual: Vec<_> = actual.iter().map(|e| e.position).collect();
        assert_eq!(expected, actual);
    }

    #[test]
    fn test_empty_slice_is_noop() {
        let updater = PositionUpdater::new(1, 1).unwrap();
        let mut none: Vec<Entity> = Vec::new();
        updater.update(&mut none, 10.0);
        assert!(none.is_empty());
    }
}
