//! # Geodesy モジュール
//!
//! WGS84楕円体に基づく測地座標とECEF座標の相互変換を提供します。
//!
//! 逆変換（ECEF→測地座標）は収束判定を行わず、固定5回の反復で打ち切ります。
//! 反復回数を変えると出力ログの数値が変わるため、回数は定数として固定しています。

use crate::models::common::{Ecef, Geodetic};

/// WGS84 長半径（m）
pub const WGS84_A: f64 = 6378137.0;
/// WGS84 扁平率
pub const WGS84_F: f64 = 1.0 / 298.257223563;
/// WGS84 第一離心率の二乗
pub const WGS84_E2: f64 = WGS84_F * (2.0 - WGS84_F);
/// 逆変換の反復回数
pub const INVERSE_ITERATIONS: usize = 5;

/// 測地座標（緯度経度高度）をECEF座標へ変換
///
/// # 引数
///
/// * `lat_deg` - 緯度（度）
/// * `lon_deg` - 経度（度）
/// * `alt_m` - 楕円体高（m）
pub fn geodetic_to_ecef(lat_deg: f64, lon_deg: f64, alt_m: f64) -> Ecef {
    let lat = lat_deg.to_radians();
    let lon = lon_deg.to_radians();

    let sin_lat = lat.sin();
    let cos_lat = lat.cos();
    let sin_lon = lon.sin();
    let cos_lon = lon.cos();

    // 卯酉線曲率半径
    let n = WGS84_A / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();

    Ecef {
        x: (n + alt_m) * cos_lat * cos_lon,
        y: (n + alt_m) * cos_lat * sin_lon,
        z: (n * (1.0 - WGS84_E2) + alt_m) * sin_lat,
    }
}

/// ECEF座標を測地座標へ変換（固定回数の反復近似）
pub fn ecef_to_geodetic(pos: Ecef) -> Geodetic {
    let p = (pos.x * pos.x + pos.y * pos.y).sqrt();
    let mut lat = (pos.z / p).atan();
    let mut lon = pos.y.atan2(pos.x);
    let mut alt = 0.0;

    for _ in 0..INVERSE_ITERATIONS {
        let sin_lat = lat.sin();
        let n = WGS84_A / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();
        alt = p / lat.cos() - n;
        lat = (pos.z / (p * (1.0 - WGS84_E2 * n / (n + alt)))).atan();
        lon = pos.y.atan2(pos.x);
    }

    Geodetic {
        lat_deg: lat.to_degrees(),
        lon_deg: lon.to_degrees(),
        alt_m: alt,
    }
}

/// ECEF空間でのユークリッド距離
pub fn distance_ecef(a: Ecef, b: Ecef) -> f64 {
    a.distance_to(&b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equator_prime_meridian() {
        let ecef = geodetic_to_ecef(0.0, 0.0, 0.0);
        assert!((ecef.x - WGS84_A).abs() < 1e-9);
        assert!(ecef.y.abs() < 1e-9);
        assert!(ecef.z.abs() < 1e-9);
    }

    #[test]
    fn test_round_trip_within_tolerance() {
        let altitudes = [-1000.0, 0.0, 123.456, 10_000.0, 50_000.0];
        let longitudes = [-179.5, -120.0, -45.25, 0.0, 30.0, 130.35, 179.9];

        let mut lat = -89.9;
        while lat <= 89.9 + 1e-9 {
            for &lon in &longitudes {
                for &alt in &altitudes {
                    let back = ecef_to_geodetic(geodetic_to_ecef(lat, lon, alt));
                    assert!(
                        (back.lat_deg - lat).abs() < 1e-6,
                        "lat mismatch at ({lat}, {lon}, {alt}): {}",
                        back.lat_deg
                    );
                    assert!(
                        (back.lon_deg - lon).abs() < 1e-6,
                        "lon mismatch at ({lat}, {lon}, {alt}): {}",
                        back.lon_deg
                    );
                    assert!(
                        (back.alt_m - alt).abs() < 1e-3,
                        "alt mismatch at ({lat}, {lon}, {alt}): {}",
                        back.alt_m
                    );
                }
            }
            lat += 7.49;
        }
    }

    #[test]
    fn test_inverse_is_deterministic() {
        let ecef = geodetic_to_ecef(35.6812, 139.7671, 40.0);
        assert_eq!(ecef_to_geodetic(ecef), ecef_to_geodetic(ecef));
    }

    #[test]
    fn test_distance_ecef() {
        let a = Ecef::new(1.0, 2.0, 2.0);
        assert_eq!(distance_ecef(a, Ecef::ORIGIN), 3.0);
        assert_eq!(distance_ecef(a, a), 0.0);
    }
}
