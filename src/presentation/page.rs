// Control page - Plotly figure, widgets and batched control submission
pub const INDEX_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>3D Viewer</title>
<script src="https://cdn.plot.ly/plotly-2.35.2.min.js"></script>
<style>
  body { font-family: sans-serif; margin: 0; display: flex; }
  #controls { width: 300px; padding: 12px; overflow-y: auto; height: 100vh; box-sizing: border-box; border-right: 1px solid #ccc; }
  #controls fieldset { margin-bottom: 10px; }
  #controls label { display: block; font-size: 13px; margin-top: 4px; }
  #controls input[type=number] { width: 90px; }
  #main { flex: 1; padding: 12px; }
  #error { color: #b00; min-height: 1.2em; }
  #waterfall { image-rendering: pixelated; max-width: 1000px; border: 1px solid #ccc; }
  #profile { max-width: 800px; border: 1px solid #ccc; }
</style>
</head>
<body>
<div id="controls">
  <fieldset>
    <legend>Microseismic</legend>
    <label>Color by <select id="color_by"></select></label>
    <label>Size by <select id="size_by"></select></label>
    <label>Colorscale <select id="events_colorscale"></select></label>
    <label>Color min <input type="number" id="events_cmin" step="any"></label>
    <label>Color max <input type="number" id="events_cmax" step="any"></label>
    <label>Time from <input type="range" id="time_from" min="0" value="0"></label>
    <label>Time to <input type="range" id="time_to" min="0" value="0"></label>
    <div id="time_label"></div>
    <button id="animate">Animate events</button>
  </fieldset>
  <fieldset id="fiber_controls">
    <legend>DAS</legend>
    <label>Colorscale <select id="fiber_colorscale"></select></label>
    <label>Color min <input type="number" id="fiber_cmin" step="any"></label>
    <label>Color max <input type="number" id="fiber_cmax" step="any"></label>
    <label>Time index <input type="range" id="fiber_index" min="0" value="0"></label>
    <label><input type="checkbox" id="fiber_full" checked> Show all samples</label>
    <label><input type="checkbox" id="fiber_follow"> Follow event window</label>
    <label>Downsample time <input type="number" id="ds_time" min="1" value="5"></label>
    <label>Downsample depth <input type="number" id="ds_depth" min="1" value="5"></label>
  </fieldset>
  <fieldset>
    <legend>Layout</legend>
    <label>Title <input type="text" id="title"></label>
    <label>Aspect <select id="aspect_mode"></select></label>
    <label>Ratio x <input type="number" id="ratio_x" step="any" min="0"> y <input type="number" id="ratio_y" step="any" min="0"> z <input type="number" id="ratio_z" step="any" min="0"></label>
    <label>X min <input type="number" id="x_min" step="any"> max <input type="number" id="x_max" step="any"></label>
    <label>Y min <input type="number" id="y_min" step="any"> max <input type="number" id="y_max" step="any"></label>
    <label>Z min <input type="number" id="z_min" step="any"> max <input type="number" id="z_max" step="any"></label>
    <button id="reset_camera">Reset camera</button>
  </fieldset>
  <div id="error"></div>
</div>
<div id="main">
  <div id="scene"></div>
  <img id="waterfall" alt="">
  <figure id="profile_panel" hidden>
    <figcaption id="profile_title"></figcaption>
    <img id="profile" alt="">
  </figure>
  <div id="animation"></div>
</div>
<script>
const $ = (id) => document.getElementById(id);
let pending = [];
let flushTimer = null;
let lastCamera = null;
let eventTimes = [];

function queue(change) {
  // later changes to the same control replace earlier ones
  pending = pending.filter((c) => c.control !== change.control ||
    (change.control === "axis_range" && c.value.axis !== change.value.axis));
  pending.push(change);
  clearTimeout(flushTimer);
  flushTimer = setTimeout(flush, 150);
}

async function flush() {
  const batch = { changes: pending, camera: lastCamera };
  pending = [];
  const response = await fetch("/api/controls", {
    method: "POST",
    headers: { "Content-Type": "application/json" },
    body: JSON.stringify(batch),
  });
  if (!response.ok) {
    const body = await response.json().catch(() => ({ error: response.statusText }));
    $("error").textContent = body.error;
    return;
  }
  $("error").textContent = "";
  refreshWaterfall();
}

function fill(select, values, selected) {
  select.innerHTML = "";
  for (const v of values) {
    const option = document.createElement("option");
    option.value = option.textContent = v;
    option.selected = v === selected;
    select.appendChild(option);
  }
}

function numberOrNull(id) {
  const v = $(id).value;
  return v === "" ? null : Number(v);
}

function rangeOrNull(minId, maxId) {
  const min = numberOrNull(minId), max = numberOrNull(maxId);
  return min === null || max === null ? null : { min, max };
}

function fiberTime() {
  if ($("fiber_follow").checked) return { mode: "follow_events" };
  if ($("fiber_full").checked) return { mode: "full" };
  return { mode: "index", value: Number($("fiber_index").value) };
}

async function refreshWaterfall() {
  if ($("fiber_controls").hidden) return;
  const response = await fetch("/api/waterfall");
  if (response.ok) $("waterfall").src = (await response.json()).image;

  const sliced = !$("fiber_full").checked && !$("fiber_follow").checked;
  $("profile_panel").hidden = !sliced;
  if (!sliced) return;
  const profile = await fetch(`/api/waterfall?time_index=${$("fiber_index").value}`);
  if (profile.ok) {
    const body = await profile.json();
    $("profile").src = body.image;
    $("profile_title").textContent = body.title;
  }
}

async function showAnimation() {
  const response = await fetch("/api/animation");
  const body = await response.json();
  if (!response.ok) {
    $("error").textContent = body.error;
    return;
  }
  await Plotly.newPlot("animation", body);
}

function showTimeWindow() {
  const a = Number($("time_from").value), b = Number($("time_to").value);
  if (eventTimes.length) {
    $("time_label").textContent = `${eventTimes[Math.min(a, b)]} to ${eventTimes[Math.max(a, b)]}`;
  }
}

async function init() {
  const options = await (await fetch("/api/options")).json();
  fill($("color_by"), options.attributes, options.color_by);
  fill($("size_by"), options.attributes, options.size_by);
  fill($("events_colorscale"), options.colorscales, "Viridis");
  fill($("fiber_colorscale"), options.colorscales, "RdBu_r");
  fill($("aspect_mode"), options.aspect_modes, "manual");
  eventTimes = options.event_times;
  const last = Math.max(eventTimes.length - 1, 0);
  $("time_from").max = $("time_to").max = last;
  $("time_to").value = last;
  showTimeWindow();
  $("fiber_index").max = Math.max(options.fiber_samples - 1, 0);
  $("fiber_controls").hidden = !options.has_fiber;

  const scene = await (await fetch("/api/scene")).json();
  $("title").value = scene.layout.title.text;
  await Plotly.newPlot("scene", scene.data, scene.layout);
  $("scene").on("plotly_relayout", (data) => {
    if (data["scene.camera"]) lastCamera = data["scene.camera"];
  });

  const stream = new EventSource("/api/scene/stream");
  stream.addEventListener("scene", (event) => {
    const next = JSON.parse(event.data);
    Plotly.react("scene", next.data, next.layout);
  });

  $("color_by").onchange = (e) => queue({ control: "color_by", value: e.target.value });
  $("size_by").onchange = (e) => queue({ control: "size_by", value: e.target.value });
  $("events_colorscale").onchange = (e) => queue({ control: "events_colorscale", value: e.target.value });
  for (const id of ["events_cmin", "events_cmax"]) {
    $(id).onchange = () => queue({ control: "events_colorbar_range", value: rangeOrNull("events_cmin", "events_cmax") });
  }
  for (const id of ["time_from", "time_to"]) {
    $(id).oninput = showTimeWindow;
    $(id).onchange = () => queue({
      control: "events_time_range",
      value: [Number($("time_from").value), Number($("time_to").value)],
    });
  }
  $("fiber_colorscale").onchange = (e) => queue({ control: "fiber_colorscale", value: e.target.value });
  for (const id of ["fiber_cmin", "fiber_cmax"]) {
    $(id).onchange = () => queue({ control: "fiber_colorbar_range", value: rangeOrNull("fiber_cmin", "fiber_cmax") });
  }
  $("fiber_index").oninput = () => { $("fiber_full").checked = false; };
  for (const id of ["fiber_index", "fiber_full", "fiber_follow"]) {
    $(id).onchange = () => queue({ control: "fiber_time", value: fiberTime() });
  }
  for (const id of ["ds_time", "ds_depth"]) {
    $(id).onchange = () => queue({
      control: "fiber_downsample",
      value: [Number($("ds_time").value), Number($("ds_depth").value)],
    });
  }
  $("title").onchange = (e) => queue({ control: "title", value: e.target.value });
  $("aspect_mode").onchange = (e) => queue({ control: "aspect_mode", value: e.target.value });
  for (const id of ["ratio_x", "ratio_y", "ratio_z"]) {
    $(id).onchange = () => {
      const [x, y, z] = ["ratio_x", "ratio_y", "ratio_z"].map(numberOrNull);
      if (x === null || y === null || z === null) return;
      $("aspect_mode").value = "manual";
      queue({ control: "aspect_ratio", value: { x, y, z } });
    };
  }
  for (const axis of ["x", "y", "z"]) {
    for (const side of ["min", "max"]) {
      $(`${axis}_${side}`).onchange = () => queue({
        control: "axis_range",
        value: { axis, min: numberOrNull(`${axis}_min`), max: numberOrNull(`${axis}_max`) },
      });
    }
  }
  $("animate").onclick = showAnimation;
  $("animate").hidden = !options.has_events;
  $("reset_camera").onclick = () => {
    lastCamera = null;
    queue({ control: "reset_camera" });
  };

  refreshWaterfall();
}

init();
</script>
</body>
</html>
"##;
