pub const INDEX_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>Bitcoin Price Guess</title>
<style>
*{box-sizing:border-box;margin:0;padding:0}
body{font-family:-apple-system,BlinkMacSystemFont,'Segoe UI',Roboto,sans-serif;background:#0f1117;color:#e1e4e8;min-height:100vh;padding:16px}
h1{font-size:24px;margin-bottom:12px;color:#58a6ff;text-align:center}
h2{font-size:14px;font-weight:600;color:#8b949e;text-transform:uppercase;letter-spacing:1px;margin-bottom:8px}
.wrap{max-width:560px;margin:0 auto;display:flex;flex-direction:column;gap:12px}
.card{background:#161b22;border:1px solid #30363d;border-radius:8px;padding:14px}
.center{text-align:center}
.stat{margin:6px 0;font-size:16px}
.stat span{color:#8b949e}
.stat strong{color:#e1e4e8;margin-left:4px}
.error{background:#3d1214;border-color:#da3633;color:#f85149;display:none}
.loading{color:#8b949e}
.row{display:flex;gap:12px;justify-content:center;margin-top:8px}
button{padding:10px 28px;border:none;border-radius:6px;font-size:15px;font-weight:700;cursor:pointer;transition:opacity .15s}
button:hover{opacity:.85}
button:disabled{opacity:.4;cursor:not-allowed}
.btn-up{background:#238636;color:#fff}
.btn-down{background:#da3633;color:#fff}
.countdown{font-size:16px;margin-top:8px;display:none}
.outcome{color:#d29922;margin-top:8px;min-height:18px}
.events{max-height:220px;overflow-y:auto;font-size:12px;font-family:'SF Mono',Monaco,Consolas,monospace}
.ev{padding:3px 0;border-bottom:1px solid #21262d;display:flex;gap:8px}
.ev-ts{color:#484f58;min-width:55px}
.ev-kind{color:#58a6ff;min-width:60px;font-weight:600}
.ev-detail{color:#c9d1d9}
.ev-error .ev-kind{color:#da3633}
.ev-resolve .ev-kind{color:#3fb950}
</style>
</head>
<body>

<div class="wrap">

<h1>Bitcoin Price Guess</h1>

<div id="errorCard" class="card error">Error: <span id="errorText"></span></div>

<div class="card center">
  <div id="loading" class="loading">Loading...</div>
  <div class="stat"><span>Current BTC Price:</span> <strong id="price">Loading...</strong></div>
  <div class="stat"><span>Your Score:</span> <strong id="score">0</strong></div>

  <div id="buttons" class="row">
    <button id="btnUp" class="btn-up" onclick="guess('up')">Up</button>
    <button id="btnDown" class="btn-down" onclick="guess('down')">Down</button>
  </div>

  <div id="countdown" class="countdown">
    Your guess: <strong id="guessDir"></strong> at <strong id="guessRef"></strong>.
    Result in: &#9201; <strong id="remaining">60</strong> seconds.
  </div>

  <div id="outcome" class="outcome"></div>
</div>

<div class="card">
  <h2>Events</h2>
  <div id="events" class="events"></div>
</div>

</div>

<script>
const API = '';

async function api(path, opts) {
  const r = await fetch(API + path, opts);
  const j = await r.json();
  if (!r.ok) throw new Error(j.detail || j.status || r.statusText);
  return j;
}

function usd(v) {
  const n = parseFloat(v);
  return isNaN(n) ? 'Loading...' : '$' + n.toFixed(2);
}

async function guess(direction) {
  try {
    await api('/api/guess', {
      method: 'POST',
      headers: {'Content-Type': 'application/json'},
      body: JSON.stringify({direction}),
    });
    askPermission();
    pollStatus();
  } catch(e) {}
}

async function pollStatus() {
  try {
    const s = await api('/api/status');
    const el = id => document.getElementById(id);

    el('loading').style.display = s.phase === 'loading' ? '' : 'none';
    el('price').textContent = s.price ? usd(s.price.usd) : 'Loading...';
    el('score').textContent = s.score;

    el('errorCard').style.display = s.error ? 'block' : 'none';
    el('errorText').textContent = s.error || '';

    const pending = !!s.guess;
    el('buttons').style.display = pending ? 'none' : '';
    el('countdown').style.display = pending ? 'block' : 'none';
    const ready = s.phase === 'ready';
    el('btnUp').disabled = !ready;
    el('btnDown').disabled = !ready;
    if (pending) {
      el('guessDir').textContent = s.guess.direction;
      el('guessRef').textContent = usd(s.guess.reference_price);
      el('remaining').textContent = s.guess.remaining_secs;
    }
    el('outcome').textContent = s.last_outcome || '';
  } catch(e) {}
}

function span(cls, text) {
  const node = document.createElement('span');
  node.className = cls;
  node.textContent = text;
  return node;
}

// Event details can carry raw backend bodies, so rows are built as text, never markup.
function eventRow(e) {
  const row = document.createElement('div');
  row.className = 'ev ev-' + e.kind;
  row.append(span('ev-ts', e.ts), span('ev-kind', e.kind), span('ev-detail', e.detail));
  return row;
}

async function pollEvents() {
  try {
    const evs = await api('/api/events');
    const box = document.getElementById('events');
    box.replaceChildren(...evs.slice().reverse().map(eventRow));
  } catch(e) {}
}

function askPermission() {
  if (!('Notification' in window)) return;
  if (Notification.permission === 'default') {
    Notification.requestPermission().catch(() => {});
  }
}

async function pollNotifications() {
  try {
    const list = await api('/api/notifications');
    if (!('Notification' in window)) return;
    for (const n of list) {
      if (Notification.permission === 'granted') {
        try { new Notification(n.title, {body: n.body}); } catch(e) {}
      } else if (Notification.permission !== 'denied') {
        Notification.requestPermission().then(p => {
          if (p === 'granted') new Notification(n.title, {body: n.body});
        }).catch(() => {});
      }
    }
  } catch(e) {}
}

pollStatus();
pollEvents();
setInterval(pollStatus, 1000);
setInterval(() => { pollEvents(); pollNotifications(); }, 2000);
</script>
</body>
</html>
"##;
