//! html served by the login and dashboard handlers.
//!
//! the dashboard is static: it polls `/historico_lixo` in the browser and
//! redraws everything client-side, so the server only fills in a few constants.

/// generic message for any failed login
pub const LOGIN_ERROR: &str = "Credenciais inválidas";

/// how often the browser polls the history api
pub const REFRESH_MS: u32 = 3000;

/// fill percentage above which the dashboard raises the alert banner
pub const LEVEL_ALERT_THRESHOLD: u32 = 80;

/// login form, optionally with the error line filled in
pub fn login(error: Option<&str>) -> String {
    LOGIN_HTML.replace("<!-- ERROR -->", &html_escape(error.unwrap_or("")))
}

/// dashboard page; `track_level` switches the chart from count to fill level
pub fn dashboard(track_level: bool) -> String {
    DASHBOARD_HTML
        .replace("/*TRACK_LEVEL*/", if track_level { "true" } else { "false" })
        .replace("/*REFRESH_MS*/", &REFRESH_MS.to_string())
        .replace("/*ALERT_LEVEL*/", &LEVEL_ALERT_THRESHOLD.to_string())
}

/// escape html special characters to prevent xss
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

const LOGIN_HTML: &str = r#"<!DOCTYPE html>
<html lang="pt">
<head>
  <meta charset="UTF-8" />
  <title>Login</title>
  <style>
    body { font-family: sans-serif; background: #e8f0fe; display: flex;
           justify-content: center; align-items: center; height: 100vh; margin: 0; }
    .card { background: white; padding: 30px; border-radius: 10px;
            box-shadow: 0 0 10px rgba(0,0,0,0.2); width: 300px; }
    input { width: 100%; padding: 10px; margin: 10px 0; box-sizing: border-box; }
    button { width: 100%; padding: 10px; background: #4CAF50; color: white;
             border: none; border-radius: 5px; cursor: pointer; }
    button:hover { background: #45A049; }
    .erro { color: red; font-size: 0.9em; margin-top: 5px; }
  </style>
</head>
<body>
  <form method="POST" action="/">
    <div class="card">
      <h2>Login</h2>
      <input type="text" name="username" placeholder="Utilizador" required />
      <input type="password" name="password" placeholder="Palavra-passe" required />
      <button type="submit">Entrar</button>
      <p class="erro"><!-- ERROR --></p>
    </div>
  </form>
</body>
</html>"#;

const DASHBOARD_HTML: &str = r#"<!DOCTYPE html>
<html lang="pt">
<head>
  <meta charset="UTF-8" />
  <title>Dashboard do Caixote de Lixo</title>
  <script src="https://cdn.jsdelivr.net/npm/chart.js"></script>
  <style>
    body { font-family: sans-serif; padding: 20px; background: #f4f4f4; margin: 0; }
    h1 { color: #2c3e50; margin-bottom: 15px; }
    .card { background: white; padding: 12px; border-radius: 8px; margin-bottom: 8px;
            box-shadow: 0 2px 5px rgba(0,0,0,0.1); display: flex;
            justify-content: space-between; font-size: 0.95em; }
    .valor { color: #2196F3; font-weight: bold; }
    .alerta { display: none; background: #e74c3c; color: white; padding: 12px;
              border-radius: 8px; margin-bottom: 15px; font-weight: bold; }
    canvas { background: white; border-radius: 8px; margin-bottom: 15px;
             box-shadow: 0 2px 5px rgba(0,0,0,0.1); }
  </style>
</head>
<body>
  <h1>Histórico do Caixote de Lixo</h1>
  <div id="alerta" class="alerta">Caixote quase cheio!</div>
  <p>Total de eventos: <strong id="total">0</strong></p>
  <canvas id="grafico" width="600" height="200"></canvas>
  <div id="historico"></div>

  <script>
    const TRACK_LEVEL = /*TRACK_LEVEL*/;
    const ALERT_LEVEL = /*ALERT_LEVEL*/;
    let chart = null;

    function numberOr0(value) {
      const parsed = TRACK_LEVEL ? parseFloat(value) : parseInt(value);
      return isNaN(parsed) ? 0 : parsed;
    }

    function refresh() {
      fetch('/historico_lixo')
        .then(response => response.json())
        .then(data => {
          document.getElementById('total').innerText = data.length;

          const latest = data.length > 0 ? numberOr0(data[0].nivel) : 0;
          document.getElementById('alerta').style.display =
            TRACK_LEVEL && latest > ALERT_LEVEL ? 'block' : 'none';

          const list = document.getElementById('historico');
          list.innerHTML = '';
          const labels = [];
          const values = [];

          // oldest first, so the chart reads left to right
          data.slice().reverse().forEach(item => {
            const card = document.createElement('div');
            card.className = 'card';
            const when = document.createElement('span');
            when.textContent = item.hora;
            const what = document.createElement('span');
            what.className = 'valor';
            what.textContent = TRACK_LEVEL
              ? 'Nível: ' + item.nivel + '% | Contagem: ' + item.deposito
              : 'Contagem: ' + item.deposito;
            card.append(when, what);
            list.appendChild(card);

            labels.push(item.hora.split(' ')[1]);
            values.push(numberOr0(TRACK_LEVEL ? item.nivel : item.deposito));
          });

          if (chart) chart.destroy();
          chart = new Chart(document.getElementById('grafico').getContext('2d'), {
            type: 'line',
            data: {
              labels: labels,
              datasets: [{
                label: TRACK_LEVEL ? 'Nível (%)' : 'Contagem',
                data: values,
                borderColor: '#2196F3',
                backgroundColor: 'rgba(33, 150, 243, 0.2)',
                borderWidth: 2,
                fill: false,
                tension: 0.2
              }]
            },
            options: { scales: { y: { beginAtZero: true } } }
          });
        })
        .catch(err => console.error('falha ao obter /historico_lixo:', err));
    }

    setInterval(refresh, /*REFRESH_MS*/);
    refresh();
  </script>
</body>
</html>"#;
