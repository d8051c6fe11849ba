//! Basic example demonstrating the three detectors
//!
//! Run with: cargo run --example basic -p anomaly

use anomaly::{AnomalyEngine, LocationPoint, PathPoint};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== anomaly Basic Examples ===\n");

    let engine = AnomalyEngine::default();

    let location_data = vec![
        LocationPoint::new(27.175015, 78.042155, "2025-09-08T10:00:00Z"),
        LocationPoint::new(27.175120, 78.042210, "2025-09-08T10:05:00Z"),
        LocationPoint::new(27.175230, 78.042315, "2025-09-08T10:10:00Z"),
        LocationPoint::new(27.175340, 78.042420, "2025-09-08T10:15:00Z"),
        // Simulated drop-off: no movement and a longer gap
        LocationPoint::new(27.175340, 78.042420, "2025-09-08T10:30:00Z"),
    ];

    // 1. Location drop-off
    println!("1. Location Drop-off (isolation forest over the window)");
    let dropoff = engine.detect_location_dropoff(&location_data)?;
    println!("   {}\n", serde_json::to_string(&dropoff)?);

    // 2. Prolonged inactivity
    println!("2. Prolonged Inactivity (threshold=15 min)");
    let inactivity = engine.detect_prolonged_inactivity(&location_data, Some(15.0))?;
    println!("   {}\n", serde_json::to_string(&inactivity)?);

    // 3. Route deviation
    println!("3. Route Deviation");
    let planned_itinerary = vec![
        PathPoint::new(27.175015, 78.042155),
        PathPoint::new(27.174015, 78.041155),
        PathPoint::new(27.173015, 78.040155),
    ];
    let current_path: Vec<PathPoint> = location_data.iter().map(PathPoint::from).collect();
    let route = engine.detect_route_deviation(&current_path, &planned_itinerary)?;
    println!("   {}\n", serde_json::to_string(&route)?);

    println!("Summary:");
    for result in [&dropoff, &inactivity, &route] {
        println!(
            "   {:<22} anomaly={:<5} score={:.4} confidence={:.4}",
            result.kind, result.anomaly, result.score, result.confidence
        );
    }

    println!("\n=== Examples Complete ===");
    Ok(())
}
