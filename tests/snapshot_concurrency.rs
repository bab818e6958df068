use solo_odds_rs::stats::{StatsSnapshot, StatsUpdate};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

const WRITES: u64 = 2_000;

#[test]
fn test_concurrent_writers_and_readers() {
    let snapshot = Arc::new(StatsSnapshot::new());
    let done = Arc::new(AtomicBool::new(false));

    let writers: Vec<_> = (0..3)
        .map(|group| {
            let snapshot = snapshot.clone();
            thread::spawn(move || {
                for i in 1..=WRITES {
                    let v = i as f64;
                    let update = match group {
                        0 => StatsUpdate::new().hashrate(v, v, format!("writer {}", i)),
                        1 => StatsUpdate::new().network(Some(v), Some(i)),
                        _ => StatsUpdate::new().cpu_temp(Some(v)),
                    };
                    snapshot.update(update);
                }
            })
        })
        .collect();

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let snapshot = snapshot.clone();
            let done = done.clone();
            thread::spawn(move || {
                let (mut rate, mut diff, mut temp) = (0.0_f64, 0.0_f64, 0.0_f64);
                let mut height = 0_u64;
                let mut reads = 0_u64;
                while !done.load(Ordering::Acquire) || reads == 0 {
                    let bytes = snapshot.snapshot().unwrap();
                    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

                    let r = json["hashrate_hps"].as_f64().unwrap();
                    assert_eq!(json["display_hashrate_hps"].as_f64().unwrap(), r);
                    assert!(r >= rate, "hashrate went back from {} to {}", rate, r);
                    rate = r;

                    if let Some(d) = json["difficulty"].as_f64() {
                        let h = json["height"].as_u64().unwrap();
                        assert_eq!(d as u64, h, "difficulty and height written together");
                        assert!(d >= diff && h >= height);
                        diff = d;
                        height = h;
                    }
                    if let Some(t) = json["cpu_temp_c"].as_f64() {
                        assert!(t >= temp);
                        temp = t;
                    }
                    reads += 1;
                }
                reads
            })
        })
        .collect();

    for writer in writers {
        writer.join().unwrap();
    }
    done.store(true, Ordering::Release);
    for reader in readers {
        assert!(reader.join().unwrap() > 0);
    }

    let state = snapshot.state();
    let last = WRITES as f64;
    assert_eq!(state.hashrate_hps, last);
    assert_eq!(state.source, format!("writer {}", WRITES));
    assert_eq!(state.difficulty, Some(last));
    assert_eq!(state.height, Some(WRITES));
    assert_eq!(state.cpu_temp_c, Some(last));
    assert!(state.time.is_some());
}
