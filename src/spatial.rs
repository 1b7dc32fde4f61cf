//! # Spatial モジュール
//!
//! ECEF空間を一辺 `cell_size` の立方体セルに区切る一様グリッドです。
//!
//! 探知処理では「同じセル＋隣接セル（3x3x3）」だけを候補として取り出し、
//! 候補に対して正確な距離判定を行います。セルサイズを探知距離と同じにすることで、
//! 探知範囲内の相手は必ずこの27セルのどこかに入ります。
//! インデックスは毎ティック位置更新後に作り直し、次のティックには持ち越しません。

use crate::models::common::Ecef;
use std::collections::HashMap;

/// セル座標（各軸の `floor(position / cell_size)`）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellKey {
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

impl CellKey {
    /// 位置が属するセル
    pub fn of(pos: Ecef, cell_size: f64) -> Self {
        Self {
            x: (pos.x / cell_size).floor() as i64,
            y: (pos.y / cell_size).floor() as i64,
            z: (pos.z / cell_size).floor() as i64,
        }
    }

    fn offset(&self, dx: i64, dy: i64, dz: i64) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
            z: self.z.saturating_add(dz),
        }
    }

    /// 自身を中心とした3x3x3の27セル
    pub fn neighborhood(self) -> impl Iterator<Item = CellKey> {
        (-1..=1).flat_map(move |dx| {
            (-1..=1).flat_map(move |dy| (-1..=1).map(move |dz| self.offset(dx, dy, dz)))
        })
    }
}

/// 1ティック分の空間ハッシュ
#[derive(Debug, Default)]
pub struct SpatialIndex {
    cell_size: f64,
    cells: HashMap<CellKey, Vec<usize>>,
}

impl SpatialIndex {
    /// 現在位置の配列からインデックスを構築
    ///
    /// `cell_size` が0以下の場合は空のインデックスを返します（探知無効）。
    /// セル内のエンティティ番号は入力順に並びます。
    pub fn build<I>(positions: I, cell_size: f64) -> Self
    where
        I: IntoIterator<Item = Ecef>,
    {
        let mut cells: HashMap<CellKey, Vec<usize>> = HashMap::new();
        if cell_size > 0.0 {
            for (index, pos) in positions.into_iter().enumerate() {
                cells.entry(CellKey::of(pos, cell_size)).or_default().push(index);
            }
        }

        Self { cell_size, cells }
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// 使用中のセル数
    pub fn occupied_cells(&self) -> usize {
        self.cells.len()
    }

    /// 指定位置の3x3x3近傍に入っているエンティティ番号
    ///
    /// 候補を絞り込むだけなので、呼び出し側で距離判定が必要です。
    pub fn neighbors(&self, pos: Ecef) -> impl Iterator<Item = usize> + '_ {
        let center = if self.cells.is_empty() {
            None
        } else {
            Some(CellKey::of(pos, self.cell_size))
        };

        center
            .into_iter()
            .flat_map(CellKey::neighborhood)
            .filter_map(|key| self.cells.get(&key))
            .flat_map(|indices| indices.iter().copied())
    }
}
