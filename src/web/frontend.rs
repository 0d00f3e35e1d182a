//! Embedded HTML/CSS/JS frontend for the tunedash web dashboard.
//!
//! The entire page is compiled into the binary as a string constant.
//! No external assets, no chart library, no CDN dependencies.

/// The complete single-page dashboard HTML.
pub const INDEX_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>tunedash</title>
<style>
:root {
  --bg: #0d1117;
  --surface: #161b22;
  --border: #30363d;
  --text: #e6edf3;
  --text-muted: #8b949e;
  --accent: #58a6ff;
  --green: #3fb950;
  --yellow: #d29922;
  --red: #f85149;
  --purple: #bc8cff;
  --radius: 8px;
  --font: -apple-system, BlinkMacSystemFont, 'Segoe UI', Helvetica, Arial, sans-serif;
  --mono: 'SF Mono', 'Cascadia Code', 'Fira Code', monospace;
}

* { margin: 0; padding: 0; box-sizing: border-box; }
body {
  background: var(--bg);
  color: var(--text);
  font-family: var(--font);
  font-size: 14px;
  line-height: 1.5;
}

.app { max-width: 1200px; margin: 0 auto; padding: 24px; }

header {
  display: flex;
  align-items: center;
  justify-content: space-between;
  margin-bottom: 24px;
  padding-bottom: 16px;
  border-bottom: 1px solid var(--border);
}

header h1 { font-size: 24px; font-weight: 600; }
header h1 .logo { color: var(--accent); font-family: var(--mono); font-weight: 700; }

.badge {
  display: inline-flex;
  padding: 4px 10px;
  border-radius: 12px;
  font-size: 12px;
  font-weight: 500;
  background: var(--surface);
  border: 1px solid var(--border);
}
.badge.ok { border-color: var(--green); color: var(--green); }
.badge.err { border-color: var(--red); color: var(--red); }

.card {
  background: var(--surface);
  border: 1px solid var(--border);
  border-radius: var(--radius);
  padding: 20px;
  margin-bottom: 16px;
}
.card h2 { font-size: 16px; font-weight: 600; margin-bottom: 16px; }

.grid-2 { display: grid; grid-template-columns: 1fr 1fr; gap: 16px; }
@media (max-width: 900px) { .grid-2 { grid-template-columns: 1fr; } }

.stat .value {
  font-size: 32px;
  font-weight: 700;
  font-family: var(--mono);
  color: var(--accent);
  line-height: 1.1;
}
.stat .label {
  font-size: 12px;
  color: var(--text-muted);
  text-transform: uppercase;
  letter-spacing: 0.5px;
}

table { width: 100%; border-collapse: collapse; font-size: 13px; }
th, td { text-align: left; padding: 8px 12px; border-bottom: 1px solid var(--border); }
th {
  color: var(--text-muted);
  font-weight: 500;
  font-size: 12px;
  text-transform: uppercase;
  letter-spacing: 0.5px;
}
td.num { text-align: right; font-family: var(--mono); }
th.num { text-align: right; }
tr:hover { background: rgba(255,255,255,0.02); }

/* Stacked activity chart: one column per day, one segment per hour */
.stack-chart {
  display: flex;
  align-items: flex-end;
  gap: 12px;
  height: 280px;
  padding-top: 12px;
}
.stack-chart .day {
  flex: 1;
  display: flex;
  flex-direction: column;
  align-items: center;
  height: 100%;
  justify-content: flex-end;
}
.stack-chart .column {
  width: 100%;
  max-width: 64px;
  display: flex;
  flex-direction: column-reverse;
  border-radius: 3px 3px 0 0;
  overflow: hidden;
}
.stack-chart .seg { width: 100%; }
.stack-chart .seg:hover { opacity: 0.75; }
.stack-chart .day-label { font-size: 12px; color: var(--text-muted); margin-top: 6px; }
.stack-chart .day-total { font-size: 11px; font-family: var(--mono); color: var(--text-muted); }

.legend { display: flex; flex-wrap: wrap; gap: 6px 12px; margin-top: 16px; font-size: 11px; color: var(--text-muted); }
.legend span::before {
  content: '';
  display: inline-block;
  width: 10px;
  height: 10px;
  border-radius: 3px;
  margin-right: 4px;
  vertical-align: middle;
  background: var(--swatch);
}

/* Predictions form */
.form-grid { display: grid; grid-template-columns: 1fr 1fr; gap: 12px 16px; }
.form-grid label { display: flex; flex-direction: column; gap: 4px; font-size: 12px; color: var(--text-muted); }
.form-grid input {
  background: var(--bg);
  border: 1px solid var(--border);
  border-radius: 6px;
  color: var(--text);
  padding: 6px 10px;
  font-size: 13px;
  font-family: var(--mono);
}
.form-grid input:focus { outline: none; border-color: var(--accent); }
.form-grid input.invalid { border-color: var(--red); }

.btn {
  margin-top: 16px;
  padding: 8px 20px;
  border: 1px solid var(--accent);
  border-radius: 6px;
  background: var(--accent);
  color: #fff;
  font-size: 13px;
  font-weight: 500;
  cursor: pointer;
}
.btn:disabled { opacity: 0.5; cursor: wait; }

.result { margin-top: 20px; display: grid; grid-template-columns: 1fr 1fr; gap: 16px; }
.result .slot { border: 1px solid var(--border); border-radius: var(--radius); padding: 16px; }
.result .slot .hint { font-size: 12px; color: var(--text-muted); }
.result .slot.failed .value { color: var(--red); font-size: 14px; font-family: var(--font); }
.high { color: var(--red) !important; }
.moderate { color: var(--yellow) !important; }
.low { color: var(--green) !important; }

.alert {
  margin-top: 16px;
  padding: 10px 14px;
  border-radius: 6px;
  border: 1px solid var(--red);
  color: var(--red);
  font-size: 13px;
}
.alert.warn { border-color: var(--yellow); color: var(--yellow); }

.empty { color: var(--text-muted); text-align: center; padding: 24px; }
</style>
</head>
<body>
<div class="app">

<header>
  <h1><span class="logo">tunedash</span> listening history</h1>
  <span class="badge" id="backend-badge">backend …</span>
</header>

<div class="grid-2">
  <div class="card">
    <h2>Basic Stats</h2>
    <div class="stat">
      <div class="value" id="total-plays">—</div>
      <div class="label">Total plays</div>
    </div>
    <h2 style="margin-top:20px">Most Played Tracks</h2>
    <table>
      <thead><tr><th>Track</th><th>Artist</th><th class="num">Plays</th></tr></thead>
      <tbody id="top-tracks"></tbody>
    </table>
  </div>

  <div class="card">
    <h2>Artist Stats</h2>
    <table>
      <thead><tr><th>Artist</th><th class="num">Plays</th><th class="num">Hours</th></tr></thead>
      <tbody id="artists"></tbody>
    </table>
  </div>
</div>

<div class="card">
  <h2>Listening Activity by Day and Hour</h2>
  <div class="stack-chart" id="activity-chart"></div>
  <div class="legend" id="activity-legend"></div>
</div>

<div class="card">
  <h2>Skip Analysis</h2>
  <table>
    <thead><tr><th>Track</th><th>Artist</th><th class="num">Plays</th><th class="num">Skips</th><th class="num">Skip rate</th></tr></thead>
    <tbody id="skips"></tbody>
  </table>
</div>

<div class="card">
  <h2>Predictions</h2>
  <form id="predict-form" autocomplete="off">
    <div class="form-grid">
      <label>Timestamp<input type="datetime-local" name="Timestamp" required></label>
      <label>Artist<input type="text" name="Artist" required></label>
      <label>Track name<input type="text" name="Track_Name" required></label>
      <label>Album<input type="text" name="Album" required></label>
      <label>Platform<input type="text" name="Platform" value="Spotify"></label>
      <label>Duration (MM:SS)<input type="text" name="Duration" placeholder="3:30" required></label>
    </div>
    <button class="btn" type="submit" id="predict-btn">Predict</button>
  </form>
  <div id="predict-output"></div>
</div>

</div>

<script>
// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------
async function api(method, path, body) {
  const opts = { method, headers: {} };
  if (body) {
    opts.headers['Content-Type'] = 'application/json';
    opts.body = JSON.stringify(body);
  }
  const res = await fetch(path, opts);
  return res.json();
}

function fmt(n) {
  if (n === undefined || n === null) return '—';
  return n.toLocaleString();
}

function esc(s) {
  const d = document.createElement('div');
  d.textContent = s == null ? '' : String(s);
  return d.innerHTML;
}

function emptyRow(cols, msg) {
  return `<tr><td colspan="${cols}" class="empty">${msg}</td></tr>`;
}

// ---------------------------------------------------------------------------
// Display sections
// ---------------------------------------------------------------------------
async function loadOverview() {
  const data = await api('GET', '/api/overview');
  document.getElementById('total-plays').textContent = fmt(data.total_plays);

  document.getElementById('top-tracks').innerHTML = data.top_tracks.length
    ? data.top_tracks.map(t =>
        `<tr><td>${esc(t['Track Name'])}</td><td>${esc(t.Artist)}</td><td class="num">${fmt(t.play_count)}</td></tr>`
      ).join('')
    : emptyRow(3, 'No data');

  document.getElementById('artists').innerHTML = data.artists.length
    ? data.artists.map(a =>
        `<tr><td>${esc(a.Artist)}</td><td class="num">${fmt(a.Total_Plays)}</td><td class="num">${a.Total_Hours_Played.toFixed(1)}</td></tr>`
      ).join('')
    : emptyRow(3, 'No data');
}

async function loadActivity() {
  const data = await api('GET', '/api/activity');
  const chart = document.getElementById('activity-chart');
  const max = data.max_day_total || 1;

  chart.innerHTML = data.labels.map((label, d) => {
    const total = data.day_totals[d];
    const segs = data.datasets
      .filter(s => s.data[d] > 0)
      .map(s => {
        const h = (s.data[d] / max) * 240;
        return `<div class="seg" style="height:${h}px;background:${s.backgroundColor}" title="${label} ${s.label}: ${s.data[d]} plays"></div>`;
      }).join('');
    return `<div class="day">
      <div class="day-total">${fmt(total)}</div>
      <div class="column">${segs}</div>
      <div class="day-label">${label}</div>
    </div>`;
  }).join('');

  document.getElementById('activity-legend').innerHTML = data.datasets
    .map(s => `<span style="--swatch:${s.backgroundColor}">${s.label}</span>`)
    .join('');
}

async function loadSkips() {
  const data = await api('GET', '/api/skips');
  document.getElementById('skips').innerHTML = data.rows.length
    ? data.rows.map(r =>
        `<tr><td>${esc(r.track_name)}</td><td>${esc(r.Artist)}</td><td class="num">${fmt(r.total_plays)}</td><td class="num">${fmt(r.skips)}</td><td class="num">${r.skip_rate.toFixed(1)}%</td></tr>`
      ).join('')
    : emptyRow(5, 'No skip data');
}

async function loadHealth() {
  const data = await api('GET', '/api/health');
  const el = document.getElementById('backend-badge');
  el.textContent = data.backend_reachable ? 'backend ✓' : 'backend unreachable';
  el.className = 'badge ' + (data.backend_reachable ? 'ok' : 'err');
}

// ---------------------------------------------------------------------------
// Predictions
// ---------------------------------------------------------------------------
const DURATION_RE = /^\d+:\d{2}$/;
let submission = 0;

function renderPrediction(r) {
  const out = document.getElementById('predict-output');
  if (r.status === 'failure') {
    out.innerHTML = `<div class="alert">${esc(r.error.message)}</div>`;
    return;
  }

  const skip = r.skip_probability != null
    ? `<div class="slot stat">
         <div class="value ${r.skip_likelihood}">${(r.skip_probability * 100).toFixed(2)}%</div>
         <div class="label">Skip probability</div>
         <div class="hint">${{ high: 'High skip likelihood', moderate: 'Moderate skip chance', low: 'Low skip probability' }[r.skip_likelihood]}</div>
       </div>`
    : `<div class="slot stat failed"><div class="value">${esc(r.skip_error.message)}</div><div class="label">Skip probability</div></div>`;

  const dur = r.session_duration_minutes != null
    ? `<div class="slot stat">
         <div class="value">${r.session_duration_minutes.toFixed(2)}</div>
         <div class="label">Session minutes</div>
       </div>`
    : `<div class="slot stat failed"><div class="value">${esc(r.duration_error.message)}</div><div class="label">Session duration</div></div>`;

  const warn = r.status === 'partial'
    ? '<div class="alert warn">One of the two predictions failed.</div>'
    : '';
  out.innerHTML = `<div class="result">${skip}${dur}</div>${warn}`;
}

document.getElementById('predict-form').addEventListener('submit', async e => {
  e.preventDefault();
  const form = e.target;
  const body = Object.fromEntries(new FormData(form).entries());
  const durationInput = form.elements.Duration;

  if (!DURATION_RE.test(body.Duration)) {
    durationInput.classList.add('invalid');
    document.getElementById('predict-output').innerHTML =
      '<div class="alert">Duration must be in MM:SS format (e.g., 3:30)</div>';
    return;
  }
  durationInput.classList.remove('invalid');

  // datetime-local is browser wall-clock time; send it as an absolute instant.
  const when = new Date(body.Timestamp);
  if (!isNaN(when)) body.Timestamp = when.toISOString();

  const mine = ++submission;
  const btn = document.getElementById('predict-btn');
  btn.disabled = true;
  try {
    const resp = await api('POST', '/api/predict', body);
    // A newer submission owns the display.
    if (mine !== submission || resp.displayed === false) return;
    if (resp.result) renderPrediction(resp.result);
    else document.getElementById('predict-output').innerHTML = `<div class="alert">${esc(resp.error)}</div>`;
  } catch (err) {
    if (mine === submission) {
      document.getElementById('predict-output').innerHTML = `<div class="alert">${esc(err.message)}</div>`;
    }
  } finally {
    if (mine === submission) btn.disabled = false;
  }
});

// ---------------------------------------------------------------------------
// Init
// ---------------------------------------------------------------------------
loadHealth();
loadOverview();
loadActivity();
loadSkips();
</script>
</body>
</html>
"##;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_references_every_api_route() {
        for route in [
            "/api/overview",
            "/api/activity",
            "/api/skips",
            "/api/predict",
            "/api/health",
        ] {
            assert!(INDEX_HTML.contains(route), "missing {route}");
        }
    }

    #[test]
    fn form_uses_wire_field_names() {
        for field in ["Timestamp", "Artist", "Track_Name", "Album", "Platform", "Duration"] {
            assert!(INDEX_HTML.contains(&format!("name=\"{field}\"")));
        }
    }
}
