use crate::models::common::Ecef;
use crate::models::geodesy::{distance_ecef, geodetic_to_ecef};
use crate::scenario::WaypointConfig;

/// 経路上の1点（緯度経度高度とロード時に求めたECEF座標）
#[derive(Debug, Clone, PartialEq)]
pub struct RoutePoint {
    pub lat_deg: f64,
    pub lon_deg: f64,
    pub alt_m: f64,
    /// この点から次の点へ向かう区間の速度（km/h）
    pub speed_kph: f64,
    pub ecef: Ecef,
}

impl RoutePoint {
    pub fn new(lat_deg: f64, lon_deg: f64, alt_m: f64, speed_kph: f64) -> Self {
        Self {
            lat_deg,
            lon_deg,
            alt_m,
            speed_kph,
            ecef: geodetic_to_ecef(lat_deg, lon_deg, alt_m),
        }
    }

    /// 区間の始点としての速度（m/s）
    pub fn speed_mps(&self) -> f64 {
        self.speed_kph * 1000.0 / 3600.0
    }
}

impl From<&WaypointConfig> for RoutePoint {
    fn from(wp: &WaypointConfig) -> Self {
        RoutePoint::new(wp.lat_deg, wp.lon_deg, wp.alt_m, wp.speed_kph)
    }
}

/// ECEF空間の折れ線経路と区間ごとの累積到達時刻
///
/// `segment_end_offsets[i]` は移動開始から区間 `i`（点 `i` → 点 `i + 1`）の
/// 終点に到達するまでの秒数です。速度0の区間は無限大となり、以降の区間には到達しません。
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Route {
    pub points: Vec<RoutePoint>,
    pub segment_end_offsets: Vec<f64>,
    pub total_duration_sec: f64,
}

impl Route {
    /// 経路点から区間の所要時間を計算して経路を構築
    pub fn new(points: Vec<RoutePoint>) -> Self {
        let (segment_end_offsets, total_duration_sec) = segment_end_offsets(&points);
        Self {
            points,
            segment_end_offsets,
            total_duration_sec,
        }
    }

    /// シナリオの経路定義から構築
    pub fn from_waypoints(waypoints: &[WaypointConfig]) -> Self {
        Self::new(waypoints.iter().map(RoutePoint::from).collect())
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn segment_count(&self) -> usize {
        self.segment_end_offsets.len()
    }

    pub fn first_position(&self) -> Option<Ecef> {
        self.points.first().map(|p| p.ecef)
    }

    pub fn last_position(&self) -> Option<Ecef> {
        self.points.last().map(|p| p.ecef)
    }
}

fn segment_end_offsets(points: &[RoutePoint]) -> (Vec<f64>, f64) {
    if points.len() < 2 {
        return (Vec::new(), 0.0);
    }

    let mut offsets = Vec::with_capacity(points.len() - 1);
    let mut acc = 0.0;

    for leg in points.windows(2) {
        let distance_m = distance_ecef(leg[0].ecef, leg[1].ecef);
        let speed_mps = leg[0].speed_mps();
        let duration = if speed_mps <= 0.0 {
            f64::INFINITY
        } else {
            distance_m / speed_mps
        };
        acc += duration;
        offsets.push(acc);
    }

    (offsets, acc)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_point_route_has_no_segments() {
        let route = Route::new(vec![RoutePoint::new(35.0, 139.0, 0.0, 50.0)]);
        assert_eq!(route.segment_count(), 0);
        assert_eq!(route.total_duration_sec, 0.0);
    }

    #[test]
    fn test_empty_route() {
        let route = Route::new(Vec::new());
        assert!(route.is_empty());
        assert_eq!(route.total_duration_sec, 0.0);
        assert_eq!(route.first_position(), None);
    }

    #[test]
    fn test_offsets_use_origin_speed() {
        let a = RoutePoint::new(35.0, 139.0, 0.0, 36.0); // 10 m/s
        let b = RoutePoint::new(35.01, 139.0, 0.0, 72.0); // 20 m/s
        let c = RoutePoint::new(35.02, 139.0, 0.0, 0.0);
        let d_ab = distance_ecef(a.ecef, b.ecef);
        let d_bc = distance_ecef(b.ecef, c.ecef);

        let route = Route::new(vec![a, b, c]);
        assert_eq!(route.segment_count(), 2);
        assert!((route.segment_end_offsets[0] - d_ab / 10.0).abs() < 1e-9);
        assert!((route.segment_end_offsets[1] - (d_ab / 10.0 + d_bc / 20.0)).abs() < 1e-9);
        assert_eq!(route.total_duration_sec, route.segment_end_offsets[1]);
    }

    #[test]
    fn test_zero_speed_leg_is_infinite() {
        let route = Route::new(vec![
            RoutePoint::new(35.0, 139.0, 0.0, 36.0),
            RoutePoint::new(35.01, 139.0, 0.0, 0.0),
            RoutePoint::new(35.02, 139.0, 0.0, 36.0),
        ]);
        assert!(route.segment_end_offsets[0].is_finite());
        assert!(route.segment_end_offsets[1].is_infinite());
        assert!(route.total_duration_sec.is_infinite());
    }

    #[test]
    fn test_offsets_non_decreasing() {
        let route = Route::new(vec![
            RoutePoint::new(10.0, 10.0, 0.0, 100.0),
            RoutePoint::new(10.0, 10.0, 0.0, 100.0),
            RoutePoint::new(10.1, 10.2, 500.0, 250.0),
            RoutePoint::new(10.3, 10.2, 0.0, 0.0),
        ]);
        assert!(route.segment_end_offsets.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(route.segment_end_offsets[0], 0.0);
    }
}
