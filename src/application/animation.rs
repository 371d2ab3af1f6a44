// Event animation - cumulative frames over the sorted origin times
use crate::application::scene_composer::{axis_layout, legend, ratio_from_extents};
use crate::application::trace_builder::{check_attributes, events_color_range, events_trace};
use crate::domain::bounds::Bounds3;
use crate::domain::catalog::{EventCatalog, MsEvent};
use crate::domain::error::{EncodeError, TraceError};
use crate::domain::render_config::{AspectMode, MsRenderConfig};
use crate::domain::scene::{
    AnimateArgs, AnimationOptions, CurrentValue, Font, Frame, FrameTiming, Layout, MenuButton, Pad, Scene,
    SceneLayout, Slider, SliderStep, Title, Transition, UpdateMenu,
};

pub const ANIMATION_TITLE: &str = "3D Bubble Chart of Cumulative Seismic Entries";
const FRAME_MS: u32 = 300;
const SIZE: u32 = 800;

fn frame_label(time: chrono::NaiveDateTime) -> String {
    time.format("%Y-%m-%d %H:%M:%S%.3f").to_string()
}

fn options(fromcurrent: Option<bool>) -> AnimationOptions {
    AnimationOptions {
        frame: FrameTiming {
            duration: FRAME_MS,
            redraw: true,
        },
        fromcurrent,
        mode: "immediate",
        transition: Transition { duration: FRAME_MS },
    }
}

/// One frame per unique origin time inside the configured window; frame `t`
/// holds every windowed event with `origin <= t`.
///
/// The color range is fixed across frames and the axes are pinned to the
/// windowed events so the view does not jump while playing.
pub fn compose_event_animation(catalog: &EventCatalog, config: &MsRenderConfig) -> Result<Scene, TraceError> {
    check_attributes(catalog, config)?;
    let (start, end) = config.window();
    let windowed = catalog.window(start, end);

    let mut times: Vec<_> = windowed.iter().map(|e| e.origin).collect();
    times.dedup();
    if times.is_empty() {
        return Err(EncodeError::EmptyWindow.into());
    }

    let range = events_color_range(&windowed, config);
    let frames: Vec<Frame> = times
        .iter()
        .map(|&time| {
            let shown: Vec<&MsEvent> = windowed.iter().copied().filter(|e| e.origin <= time).collect();
            Frame {
                name: frame_label(time),
                data: vec![events_trace(&shown, config, range)],
            }
        })
        .collect();
    tracing::debug!("Event animation with {} frames over {} events", frames.len(), windowed.len());

    let bounds = Bounds3::from_columns(
        &windowed.iter().map(|e| e.easting).collect::<Vec<_>>(),
        &windowed.iter().map(|e| e.northing).collect::<Vec<_>>(),
        &windowed.iter().map(|e| e.depth_tvdss).collect::<Vec<_>>(),
    );
    let (x, y, z) = (bounds.map(|b| b.x), bounds.map(|b| b.y), bounds.map(|b| b.z));

    let steps = frames
        .iter()
        .map(|frame| SliderStep {
            args: AnimateArgs(Some(vec![frame.name.clone()]), options(None)),
            label: frame.name.clone(),
            method: "animate",
        })
        .collect();

    let layout = Layout {
        title: Title::new(ANIMATION_TITLE),
        width: SIZE,
        height: SIZE,
        scene: SceneLayout {
            xaxis: axis_layout("Easting (ft)", x, false),
            yaxis: axis_layout("Northing (ft)", y, false),
            zaxis: axis_layout("TVDSS (ft)", z, true),
            aspectmode: AspectMode::Manual,
            aspectratio: Some(ratio_from_extents(x, y, z)),
            camera: None,
        },
        legend: legend(1.18),
        margin: None,
        sliders: vec![Slider {
            active: 0,
            currentvalue: CurrentValue {
                font: Font { size: 20 },
                visible: true,
                xanchor: "center",
                prefix: "Time: ",
            },
            pad: Pad {
                b: Some(10),
                ..Pad::default()
            },
            steps,
        }],
        updatemenus: vec![UpdateMenu {
            buttons: vec![MenuButton {
                args: AnimateArgs(None, options(Some(true))),
                label: "Play",
                method: "animate",
            }],
            direction: "left",
            pad: Pad {
                r: Some(10),
                t: Some(87),
                ..Pad::default()
            },
            showactive: false,
            kind: "buttons",
            x: 0.1,
            xanchor: "right",
            y: 0.0,
            yanchor: "top",
        }],
    };

    Ok(Scene {
        data: frames[0].data.clone(),
        layout,
        frames,
    })
}
