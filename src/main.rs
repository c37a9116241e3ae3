use anyhow::{bail, Context, Result};
use nalgebra::{Quaternion, Vector3};
use std::io::{self, Write};
use upperbody_tracker::config::Config;
use upperbody_tracker::pose::{ArmSample, FrameInput, HeadPose};
use upperbody_tracker::tracker::{AnthropometricModel, SkeletonAngles, SkeletonReconstructor};

const CONFIG_PATH: &str = "config.toml";

fn parse_floats<const N: usize>(args: &[&str]) -> Result<[f32; N]> {
    if args.len() != N {
        bail!("数値が{}個必要です ({}個指定)", N, args.len());
    }
    let mut out = [0.0; N];
    for (slot, arg) in out.iter_mut().zip(args) {
        *slot = arg.parse().with_context(|| format!("数値ではありません: {}", arg))?;
    }
    Ok(out)
}

fn parse_point(args: &[&str]) -> Result<Vector3<f32>> {
    parse_floats::<3>(args).map(Vector3::from)
}

fn print_frame(reconstructor: &SkeletonReconstructor, frame: &FrameInput) {
    let h = &frame.head;
    match reconstructor.reconstruct_detailed(
        h.position,
        h.orientation,
        frame.left.wrist,
        frame.right.wrist,
        frame.left.forearm,
        frame.right.forearm,
    ) {
        Ok((skeleton, warnings)) => {
            for (joint, p) in skeleton.iter() {
                let marker = if joint.is_tracked() { " " } else { "*" };
                println!("  {}{:<14} [{:>7.3}, {:>7.3}, {:>7.3}]", marker, joint.name(), p.x, p.y, p.z);
            }
            for (name, angle) in SkeletonAngles::from_skeleton(&skeleton).to_named_map() {
                println!("   {:<20} {:>6.1}°", name, angle);
            }
            for w in warnings {
                println!("  警告: {:?}", w);
            }
        }
        Err(e) => println!("  再構成失敗: {}", e),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(tracing::Level::INFO)
        .init();

    let config = Config::load_or_default(CONFIG_PATH);
    let mut reconstructor = SkeletonReconstructor::from_config(&config)?;

    println!("=== Upper Body Tracker {} ===", env!("GIT_VERSION"));
    println!("身長: {} m", reconstructor.model().height());
    println!();
    println!("コマンド:");
    println!("  h x y z          - 頭の位置 (例: h 0 1.6 0)");
    println!("  o x y z w        - 頭の回転クォータニオン (例: o 0 0 0 1)");
    println!("  lw|rw x y z      - 左/右手首");
    println!("  lf|rf x y z      - 左/右前腕点");
    println!("  height m         - 身長（メートル）");
    println!("  s                - 再構成して関節を表示 (* = 推定値)");
    println!("  q                - 終了");
    println!();

    let mut frame = FrameInput::new(
        HeadPose::identity_at(Vector3::new(0.0, 1.6, 0.0)),
        ArmSample::new(Vector3::new(-0.3, 1.0, 0.2), Vector3::new(-0.2, 1.2, 0.1)),
        ArmSample::new(Vector3::new(0.3, 1.0, 0.2), Vector3::new(0.2, 1.2, 0.1)),
    );

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let parts: Vec<&str> = input.split_whitespace().collect();
        let Some((&command, args)) = parts.split_first() else {
            continue;
        };

        let result: Result<()> = match command {
            "h" => parse_point(args).map(|p| frame.head.position = p),
            "o" => parse_floats::<4>(args).map(|[x, y, z, w]| {
                frame.head.orientation = Quaternion::new(w, x, y, z);
            }),
            "lw" => parse_point(args).map(|p| frame.left.wrist = p),
            "rw" => parse_point(args).map(|p| frame.right.wrist = p),
            "lf" => parse_point(args).map(|p| frame.left.forearm = p),
            "rf" => parse_point(args).map(|p| frame.right.forearm = p),
            "height" => parse_floats::<1>(args).and_then(|[h]| {
                let model = AnthropometricModel::new(h)?;
                reconstructor = SkeletonReconstructor::new(model, &config.reconstruction)?;
                println!("身長: {} m (上腕 {:.3} m)", h, model.upper_arm_length());
                Ok(())
            }),
            "s" => {
                print_frame(&reconstructor, &frame);
                Ok(())
            }
            "q" => {
                println!("終了します");
                break;
            }
            other => {
                println!("不明なコマンド: {}", other);
                Ok(())
            }
        };
        if let Err(e) = result {
            println!("エラー: {:#}", e);
        }
    }

    Ok(())
}
