use anyhow::{Context, Result};
use nalgebra::{Quaternion, UnitQuaternion, Vector3};
use serde_json::json;
use std::f32::consts::TAU;

use upperbody_tracker::config::Config;
use upperbody_tracker::pose::{FrameInput, HeadPose, PoseSample, SequenceInputs, Side};
use upperbody_tracker::tracker::{
    filter_from_config, HeadTrack, LastValidHold, SkeletonAngles, SkeletonReconstructor,
};

const CONFIG_PATH: &str = "config.toml";
const DURATION_SECS: f64 = 4.0;
const HEAD_RATE: f64 = 72.0;
const HAND_RATE: f64 = 30.0;
const SWAY_HZ: f32 = 0.5;
/// Every Nth hand frame gets a zero head quaternion, as a dropped tracking sample would
const GLITCH_EVERY: usize = 40;
/// 左手は DROPOUT_EVERY フレームごとに DROPOUT_LEN フレーム見失う
const DROPOUT_EVERY: usize = 50;
const DROPOUT_LEN: usize = 4;

fn head_sample(t: f64) -> PoseSample {
    let phase = TAU * SWAY_HZ * t as f32;
    let position = Vector3::new(0.05 * phase.sin(), 1.6 + 0.01 * (2.0 * phase).sin(), 0.0);
    let roll = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), 0.15 * phase.sin());
    PoseSample::new(t, HeadPose::new(position, *roll.quaternion()))
}

/// Wrist and forearm point of one hand, swinging forward and back out of phase
fn hand_points(side: Side, t: f64, forearm_length: f32) -> (Vector3<f32>, Vector3<f32>) {
    let phase = TAU * SWAY_HZ * t as f32 + if side == Side::Left { 0.0 } else { TAU / 2.0 };
    let x = side.sign() * 0.25;
    let wrist = Vector3::new(x, 1.0 + 0.05 * phase.cos(), 0.2 + 0.15 * phase.sin());
    let elbow_guess = Vector3::new(x, 1.15, 0.05 + 0.05 * phase.sin());
    let toward_elbow = (elbow_guess - wrist).normalize();
    (wrist, wrist + toward_elbow * forearm_length)
}

fn timestamps(rate: f64) -> Vec<f64> {
    let n = (DURATION_SECS * rate) as usize;
    (0..n).map(|i| i as f64 / rate).collect()
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(tracing::Level::INFO)
        .init();

    let config = Config::load_or_default(CONFIG_PATH);
    let reconstructor = SkeletonReconstructor::from_config(&config)?;
    let mut filter = filter_from_config(&config)?;
    let mut hold = LastValidHold::new();
    let forearm_length = reconstructor.model().forearm_length();

    eprintln!("sway_replay {}", env!("GIT_VERSION"));
    eprintln!(
        "height={} head={}Hz hands={}Hz filter={:?} parallel={}",
        config.body.height, HEAD_RATE, HAND_RATE, config.smooth.mode, config.reconstruction.parallel
    );

    let head = HeadTrack::new(timestamps(HEAD_RATE).into_iter().map(head_sample).collect())
        .context("building head track")?;
    let hand_times = timestamps(HAND_RATE);
    let head_poses = head.resample(&hand_times);

    let head_positions: Vec<Vector3<f32>> = head_poses.iter().map(|p| p.position).collect();
    let head_orientations: Vec<Quaternion<f32>> = head_poses
        .iter()
        .enumerate()
        .map(|(i, p)| {
            if i > 0 && i % GLITCH_EVERY == 0 {
                Quaternion::new(0.0, 0.0, 0.0, 0.0)
            } else {
                p.orientation
            }
        })
        .collect();
    let hand = |side: Side| -> (Vec<Vector3<f32>>, Vec<Vector3<f32>>) {
        hand_times.iter().map(|&t| hand_points(side, t, forearm_length)).unzip()
    };
    let (mut left_wrists, mut left_forearms) = hand(Side::Left);
    let (right_wrists, right_forearms) = hand(Side::Right);
    let lost = Vector3::repeat(f32::NAN);
    for i in (DROPOUT_EVERY..hand_times.len()).filter(|i| i % DROPOUT_EVERY < DROPOUT_LEN) {
        left_wrists[i] = lost;
        left_forearms[i] = lost;
    }

    let raw = SequenceInputs {
        head_positions: &head_positions,
        head_orientations: &head_orientations,
        left_wrists: &left_wrists,
        right_wrists: &right_wrists,
        left_forearms: &left_forearms,
        right_forearms: &right_forearms,
    };
    // 見失った手は時系列順に直前の値で埋めてから一括で再構成する
    let filled: Vec<FrameInput> = (0..raw.len())
        .filter_map(|i| raw.frame(i))
        .map(|frame| hold.fill_arms(&frame))
        .collect();
    let column = |pick: fn(&FrameInput) -> Vector3<f32>| -> Vec<Vector3<f32>> { filled.iter().map(pick).collect() };
    let (left_wrists, right_wrists) = (column(|f| f.left.wrist), column(|f| f.right.wrist));
    let (left_forearms, right_forearms) = (column(|f| f.left.forearm), column(|f| f.right.forearm));

    let result = reconstructor.reconstruct_sequence(SequenceInputs {
        head_positions: &head_positions,
        head_orientations: &head_orientations,
        left_wrists: &left_wrists,
        right_wrists: &right_wrists,
        left_forearms: &left_forearms,
        right_forearms: &right_forearms,
    });
    let failed = result.failed_count();
    let frames = hold.resolve_all(result.frames)?;

    for (&t, skeleton) in hand_times.iter().zip(frames) {
        let Some(skeleton) = skeleton else {
            println!("{}", json!({ "t": t, "joints": null }));
            continue;
        };
        let skeleton = match filter.as_mut() {
            Some(f) => f.apply(t, &skeleton)?,
            None => skeleton,
        };
        let angles = SkeletonAngles::from_skeleton(&skeleton);
        println!(
            "{}",
            json!({
                "t": t,
                "joints": skeleton.to_named_map(),
                "angles": angles.to_named_map(),
            })
        );
    }

    eprintln!(
        "{} frames, {} held, {} arm samples filled",
        hand_times.len(),
        failed,
        hold.held_arms()
    );
    Ok(())
}
