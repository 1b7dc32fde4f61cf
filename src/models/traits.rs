use crate::models::common::{Ecef, Role};

/// 全てのシミュレーションオブジェクトが実装する基本インターフェース
pub trait IAgent {
    /// オブジェクトIDの取得
    fn get_id(&self) -> &str;

    /// 所属チームIDの取得
    fn get_team_id(&self) -> &str;

    /// 役割の取得
    fn get_role(&self) -> Role;
}

/// 経路に沿って移動するオブジェクトのインターフェース
///
/// 位置は「自身の静的データ」と「シミュレーション時刻」だけから決まり、
/// 他のオブジェクトの状態には依存しません。
pub trait IMovable {
    /// 指定時刻の位置を計算（副作用なし）
    fn position_at_time(&self, time_sec: f64) -> Ecef;

    /// 現在位置の取得
    fn get_position(&self) -> Ecef;

    /// 現在位置の設定
    fn set_position(&mut self, position: Ecef);

    /// 指定時刻の位置へ更新
    fn update_position(&mut self, time_sec: f64) {
        let position = self.position_at_time(time_sec);
        self.set_position(position);
    }
}
