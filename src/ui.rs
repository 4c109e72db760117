use crate::config::Features;
use crate::plan::{DayKey, TaskCoord};
use crate::progress::progress_text;
use crate::store::ProgressStore;
use std::fmt::Write;

pub fn render_index(store: &ProgressStore, features: Features) -> String {
    let plan = store.plan();
    INDEX_HTML
        .replace("{{TITLE}}", &escape(&plan.title))
        .replace("{{OVERALL}}", &store.overall_percentage().to_string())
        .replace(
            "{{PROGRESS_TEXT}}",
            &progress_text(store.completed_count(), store.total_tasks()),
        )
        .replace("{{WEEK_COUNT}}", &plan.week_count().to_string())
        .replace("{{TOOLBAR}}", &render_toolbar(features))
        .replace("{{TABS}}", &render_tabs(store))
        .replace("{{WEEKS}}", &render_weeks(store, features))
}

fn render_toolbar(features: Features) -> String {
    let mut out = String::new();
    if features.search {
        out.push_str(
            r#"<div class="search">
        <input id="search-input" type="search" placeholder="Search topics and tasks" autocomplete="off" />
        <div id="search-results" class="dropdown hidden"></div>
      </div>"#,
        );
    }
    if features.bookmarks {
        out.push_str(
            r#"<div class="bookmarks">
        <button id="bookmarks-btn" type="button" class="ghost">Bookmarks</button>
        <div id="bookmarks-menu" class="dropdown hidden"></div>
      </div>"#,
        );
    }
    out
}

fn render_tabs(store: &ProgressStore) -> String {
    let mut out = String::new();
    for (idx, week) in store.plan().weeks.iter().enumerate() {
        let number = idx as u32 + 1;
        let pct = store.week_percentage(number);
        let mut classes = String::from("week-tab");
        if number == store.current_week() {
            classes.push_str(" active");
        }
        if pct == 100 {
            classes.push_str(" completed");
        }
        let _ = write!(
            out,
            r#"<form method="post" action="/weeks/{number}/select"><button type="submit" class="{classes}" data-week="{number}" title="{title}">Week {number} <span class="week-progress" id="week-{number}-progress">{pct}%</span></button></form>"#,
            title = escape(&week.title),
        );
    }
    out
}

fn render_weeks(store: &ProgressStore, features: Features) -> String {
    let plan = store.plan();
    let mut out = String::new();
    for (w, week) in plan.weeks.iter().enumerate() {
        let number = w as u32 + 1;
        let active = if number == store.current_week() { " active" } else { "" };
        let pct = store.week_percentage(number);
        let _ = write!(
            out,
            r#"<section class="week-content{active}" id="week-{number}">
      <div class="week-head"><h2>{title}</h2><div class="bar"><div class="fill" id="week-{number}-fill" style="width: {pct}%"></div></div></div>
      <div class="days">"#,
            title = escape(&week.title),
        );
        for (d, day) in week.days.iter().enumerate() {
            let key = DayKey::new(number, d as u32 + 1);
            render_day(&mut out, store, key, &day.title, &day.tasks, features);
        }
        out.push_str("</div>\n    </section>\n");
    }
    out
}

fn render_day(
    out: &mut String,
    store: &ProgressStore,
    key: DayKey,
    title: &str,
    tasks: &[String],
    features: Features,
) {
    let _ = write!(
        out,
        r#"<article class="day-card" data-week="{week}" data-day="{day}">
        <header><h4>Day {day}: {title}</h4>"#,
        week = key.week,
        day = key.day,
        title = escape(title),
    );
    if features.bookmarks {
        let active = if store.is_bookmarked(key) { " active" } else { "" };
        let _ = write!(
            out,
            r#"<button type="button" class="bookmark-day ghost{active}" data-week="{}" data-day="{}" aria-label="Bookmark">&#9733;</button>"#,
            key.week, key.day,
        );
    }
    out.push_str("</header>\n        <ul class=\"task-list\">");

    for (index, text) in tasks.iter().enumerate() {
        let coord = TaskCoord::new(key.week, key.day, index);
        let done = store.is_completed(coord);
        let _ = write!(
            out,
            r#"<li class="task-item{completed}"><form method="post" action="/tasks/{week}/{day}/{index}/toggle"><label><input type="checkbox" class="task-checkbox" data-week="{week}" data-day="{day}" data-index="{index}"{checked} /><span class="task-text">{text}</span></label><noscript><button type="submit" class="ghost">Toggle</button></noscript></form></li>"#,
            completed = if done { " completed" } else { "" },
            checked = if done { " checked" } else { "" },
            week = key.week,
            day = key.day,
            text = escape(text),
        );
    }
    out.push_str("</ul>");

    if features.notes {
        let _ = write!(
            out,
            r#"<textarea class="day-note" data-week="{}" data-day="{}" placeholder="Add your notes here...">{}</textarea>"#,
            key.week,
            key.day,
            escape(store.note(key).unwrap_or_default()),
        );
    }
    out.push_str("</article>\n");
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>{{TITLE}}</title>
  <style>
    :root {
      --bg: #f4f7fb;
      --ink: #1f2a37;
      --muted: #6b7280;
      --accent: #0f766e;
      --done: #10b981;
      --card: #ffffff;
      --shadow: 0 18px 40px rgba(15, 118, 110, 0.12);
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      background: var(--bg);
      color: var(--ink);
      font-family: "Inter", "Segoe UI", sans-serif;
    }

    main {
      width: min(1100px, 100%);
      margin: 0 auto;
      padding: 28px 18px 64px;
      display: grid;
      gap: 22px;
    }

    .topbar {
      display: flex;
      flex-wrap: wrap;
      gap: 12px;
      align-items: center;
      justify-content: space-between;
    }

    .toolbar {
      display: flex;
      gap: 10px;
      align-items: center;
    }

    h1 {
      margin: 0;
      font-size: clamp(1.6rem, 3vw, 2.2rem);
    }

    .overall {
      background: var(--card);
      border-radius: 18px;
      box-shadow: var(--shadow);
      padding: 18px 22px;
      display: grid;
      gap: 10px;
    }

    .bar {
      height: 10px;
      border-radius: 999px;
      background: #e5e7eb;
      overflow: hidden;
    }

    .fill {
      height: 100%;
      background: var(--accent);
      transition: width 300ms ease;
    }

    .tabs {
      display: flex;
      flex-wrap: wrap;
      gap: 8px;
    }

    .tabs form {
      margin: 0;
    }

    button {
      appearance: none;
      border: none;
      border-radius: 999px;
      padding: 10px 16px;
      font-weight: 600;
      cursor: pointer;
      background: var(--accent);
      color: white;
    }

    a.button {
      padding: 10px 16px;
      display: inline-block;
      border-radius: 999px;
      font-weight: 600;
      text-decoration: none;
    }

    button.ghost,
    a.button.ghost {
      background: transparent;
      color: var(--accent);
      padding: 6px 10px;
    }

    .week-tab {
      background: white;
      color: var(--ink);
      border: 1px solid #d1d5db;
    }

    .week-tab.active {
      background: var(--accent);
      color: white;
    }

    .week-tab.completed .week-progress::after {
      content: " \2713";
    }

    .week-content {
      display: none;
    }

    .week-content.active {
      display: grid;
      gap: 14px;
    }

    .days {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(260px, 1fr));
      gap: 14px;
    }

    .day-card {
      background: var(--card);
      border-radius: 16px;
      padding: 16px;
      box-shadow: var(--shadow);
    }

    .day-card header {
      display: flex;
      justify-content: space-between;
      align-items: center;
    }

    .day-card h4 {
      margin: 0;
    }

    .bookmark-day.active {
      color: #f59e0b;
    }

    .task-list {
      list-style: none;
      padding: 0;
      margin: 12px 0;
      display: grid;
      gap: 8px;
    }

    .task-item form {
      margin: 0;
    }

    .task-item.completed .task-text {
      color: var(--muted);
      text-decoration: line-through;
    }

    .day-note {
      width: 100%;
      min-height: 60px;
      border-radius: 10px;
      border: 1px solid #d1d5db;
      padding: 8px;
      font: inherit;
    }

    .dropdown {
      position: absolute;
      background: white;
      border-radius: 12px;
      box-shadow: var(--shadow);
      min-width: 240px;
      z-index: 10;
    }

    .dropdown div {
      padding: 10px 14px;
      cursor: pointer;
    }

    .hidden {
      display: none;
    }

    .panel {
      background: var(--card);
      border-radius: 18px;
      padding: 18px 22px;
      box-shadow: var(--shadow);
      display: grid;
      gap: 12px;
    }

    .panel-row {
      display: flex;
      flex-wrap: wrap;
      gap: 10px;
      align-items: center;
    }

    #timer-display {
      font-variant-numeric: tabular-nums;
      font-size: 1.6rem;
      font-weight: 600;
    }

    #chat-window {
      max-height: 320px;
      overflow-y: auto;
      display: grid;
      gap: 8px;
    }

    .chat-message {
      padding: 10px 14px;
      border-radius: 12px;
      background: #eef2f7;
    }

    .chat-message.user {
      background: #d1fae5;
      justify-self: end;
    }

    .celebration {
      position: fixed;
      top: 20%;
      left: 50%;
      transform: translateX(-50%);
      font-size: 3rem;
      pointer-events: none;
      animation: celebration 2s ease-out forwards;
    }

    @keyframes celebration {
      0% { opacity: 1; transform: translateX(-50%) scale(0); }
      50% { opacity: 1; transform: translateX(-50%) scale(1.2); }
      100% { opacity: 0; transform: translateX(-50%) scale(1) translateY(-50px); }
    }
  </style>
</head>
<body>
  <main>
    <div class="topbar">
      <h1>{{TITLE}}</h1>
      <div class="toolbar">{{TOOLBAR}}</div>
    </div>

    <section class="overall">
      <div class="bar"><div class="fill" id="overall-progress-fill" style="width: {{OVERALL}}%"></div></div>
      <div><strong id="progress-percentage">{{OVERALL}}%</strong> &middot; <span id="progress-text">{{PROGRESS_TEXT}}</span></div>
    </section>

    <nav class="tabs">{{TABS}}</nav>

    {{WEEKS}}

    <section class="panel">
      <h3>Study session</h3>
      <div class="panel-row">
        <span id="timer-display">25:00</span>
        <input id="timer-minutes" type="number" min="1" max="120" value="25" />
        <button id="start-timer" type="button">Start</button>
        <button id="stop-timer" type="button" class="ghost" disabled>Stop</button>
      </div>
      <div class="panel-row">
        <a href="/api/export" download class="button ghost">Export progress</a>
        <button id="reset-progress" type="button" class="ghost">Reset progress</button>
      </div>
    </section>

    <section class="panel">
      <h3>Study assistant</h3>
      <div id="chat-window"></div>
      <form id="chat-input-form" class="panel-row">
        <input id="chat-input" type="text" placeholder="Ask a question" autocomplete="off" />
        <button id="send-button" type="submit">Send</button>
      </form>
    </section>
  </main>

  <script>
    const weekCount = {{WEEK_COUNT}};

    const postJson = async (url, body, method = 'POST') => {
      const response = await fetch(url, {
        method,
        headers: { 'Content-Type': 'application/json' },
        body: JSON.stringify(body),
      });
      if (!response.ok) {
        throw new Error(`request failed: ${response.status}`);
      }
      return response.json();
    };

    const renderProgress = (progress) => {
      document.getElementById('overall-progress-fill').style.width = `${progress.overall_percentage}%`;
      document.getElementById('progress-percentage').textContent = `${progress.overall_percentage}%`;
      document.getElementById('progress-text').textContent = progress.progress_text;
      progress.weeks.forEach((week) => {
        document.getElementById(`week-${week.week}-fill`).style.width = `${week.percentage}%`;
        document.getElementById(`week-${week.week}-progress`).textContent = `${week.percentage}%`;
        const tab = document.querySelector(`.week-tab[data-week="${week.week}"]`);
        if (tab) tab.classList.toggle('completed', week.complete);
      });
    };

    const showWeek = (week) => {
      document.querySelectorAll('.week-tab').forEach((tab) => {
        tab.classList.toggle('active', Number(tab.dataset.week) === week);
      });
      document.querySelectorAll('.week-content').forEach((content) => {
        content.classList.toggle('active', content.id === `week-${week}`);
      });
    };

    const switchWeek = async (week) => {
      if (week < 1 || week > weekCount) return;
      const progress = await postJson('/api/week', { week });
      showWeek(progress.current_week);
    };

    const celebrate = () => {
      const el = document.createElement('div');
      el.className = 'celebration';
      el.textContent = '\u{1F389}';
      document.body.appendChild(el);
      setTimeout(() => el.remove(), 2000);
    };

    document.querySelectorAll('.week-tab').forEach((tab) => {
      tab.addEventListener('click', (event) => {
        event.preventDefault();
        switchWeek(Number(tab.dataset.week)).catch(console.error);
      });
    });

    document.querySelectorAll('.task-checkbox').forEach((checkbox) => {
      checkbox.addEventListener('change', async () => {
        const body = {
          week: Number(checkbox.dataset.week),
          day: Number(checkbox.dataset.day),
          index: Number(checkbox.dataset.index),
        };
        try {
          const result = await postJson('/api/tasks/toggle', body);
          checkbox.checked = result.completed;
          checkbox.closest('.task-item').classList.toggle('completed', result.completed);
          renderProgress(result.progress);
          if (result.milestone) celebrate();
        } catch (err) {
          checkbox.checked = !checkbox.checked;
          console.error(err);
        }
      });
    });

    document.querySelectorAll('.bookmark-day').forEach((button) => {
      button.addEventListener('click', async () => {
        const result = await postJson('/api/bookmarks/toggle', {
          week: Number(button.dataset.week),
          day: Number(button.dataset.day),
        });
        button.classList.toggle('active', result.bookmarked);
      });
    });

    const bookmarksBtn = document.getElementById('bookmarks-btn');
    if (bookmarksBtn) {
      const menu = document.getElementById('bookmarks-menu');
      bookmarksBtn.addEventListener('click', async () => {
        menu.classList.toggle('hidden');
        if (menu.classList.contains('hidden')) return;
        const entries = await (await fetch('/api/bookmarks')).json();
        menu.innerHTML = '';
        if (!entries.length) {
          menu.innerHTML = '<div>No bookmarks yet</div>';
          return;
        }
        entries.forEach((entry) => {
          const item = document.createElement('div');
          item.textContent = entry.title;
          item.addEventListener('click', () => {
            menu.classList.add('hidden');
            switchWeek(entry.week).catch(console.error);
          });
          menu.appendChild(item);
        });
      });
    }

    document.querySelectorAll('.day-note').forEach((area) => {
      let pending = null;
      area.addEventListener('input', () => {
        clearTimeout(pending);
        pending = setTimeout(() => {
          postJson('/api/notes', {
            week: Number(area.dataset.week),
            day: Number(area.dataset.day),
            text: area.value,
          }, 'PUT').catch(console.error);
        }, 400);
      });
    });

    const searchInput = document.getElementById('search-input');
    if (searchInput) {
      const results = document.getElementById('search-results');
      searchInput.addEventListener('input', async () => {
        const query = searchInput.value.trim();
        if (!query) {
          results.classList.add('hidden');
          return;
        }
        const hits = await (await fetch(`/api/search?q=${encodeURIComponent(query)}`)).json();
        results.innerHTML = '';
        if (!hits.length) {
          results.innerHTML = '<div>No results found</div>';
        }
        hits.forEach((hit) => {
          const item = document.createElement('div');
          item.textContent = `${hit.title} (Week ${hit.week}, Day ${hit.day})`;
          item.addEventListener('click', () => {
            results.classList.add('hidden');
            switchWeek(hit.week).catch(console.error);
          });
          results.appendChild(item);
        });
        results.classList.remove('hidden');
      });
    }

    document.getElementById('reset-progress').addEventListener('click', async () => {
      if (!confirm('Are you sure you want to reset all progress? This action cannot be undone.')) return;
      await postJson('/api/reset', { confirm: true });
      window.location.reload();
    });

    document.addEventListener('keydown', (event) => {
      if (event.target.matches('input, textarea') || event.ctrlKey || event.altKey) return;
      const week = Number(event.key);
      if (week >= 1 && week <= weekCount) {
        switchWeek(week).catch(console.error);
      }
    });

    const timerDisplay = document.getElementById('timer-display');
    const timerMinutes = document.getElementById('timer-minutes');
    const startTimer = document.getElementById('start-timer');
    const stopTimer = document.getElementById('stop-timer');
    let timerDuration = 25 * 60;
    let timerRemaining = timerDuration;
    let timerHandle = null;

    const drawTimer = () => {
      const minutes = String(Math.floor(timerRemaining / 60)).padStart(2, '0');
      const seconds = String(timerRemaining % 60).padStart(2, '0');
      timerDisplay.textContent = `${minutes}:${seconds}`;
    };

    const haltTimer = () => {
      clearInterval(timerHandle);
      timerHandle = null;
      startTimer.disabled = false;
      stopTimer.disabled = true;
      timerRemaining = timerDuration;
      drawTimer();
    };

    startTimer.addEventListener('click', () => {
      if (timerHandle) return;
      startTimer.disabled = true;
      stopTimer.disabled = false;
      timerHandle = setInterval(() => {
        timerRemaining -= 1;
        drawTimer();
        if (timerRemaining <= 0) {
          haltTimer();
          alert('Study session complete! Great job!');
        }
      }, 1000);
    });
    stopTimer.addEventListener('click', haltTimer);
    timerMinutes.addEventListener('change', () => {
      timerDuration = Math.max(1, Number(timerMinutes.value) || 25) * 60;
      timerRemaining = timerDuration;
      drawTimer();
    });

    const chatWindow = document.getElementById('chat-window');
    const chatInput = document.getElementById('chat-input');
    const sendButton = document.getElementById('send-button');

    const addMessage = (text, who) => {
      const bubble = document.createElement('div');
      bubble.className = `chat-message ${who}`;
      bubble.textContent = text;
      chatWindow.appendChild(bubble);
      chatWindow.scrollTop = chatWindow.scrollHeight;
    };

    document.getElementById('chat-input-form').addEventListener('submit', async (event) => {
      event.preventDefault();
      const message = chatInput.value.trim();
      if (!message) return;
      chatInput.value = '';
      sendButton.disabled = true;
      addMessage(message, 'user');
      try {
        const result = await postJson('/api/chat', { message });
        addMessage(result.reply, 'assistant');
      } catch (err) {
        addMessage('Sorry, I encountered an error. Please try again.', 'assistant');
      }
      sendButton.disabled = false;
    });
  </script>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Edition;
    use crate::plan::{Day, StudyPlan, Week};
    use std::sync::Arc;

    fn store() -> ProgressStore {
        ProgressStore::new(Arc::new(StudyPlan::default_plan()))
    }

    #[test]
    fn completed_tasks_render_checked() {
        let mut store = store();
        store.toggle_task(TaskCoord::new(1, 1, 0)).unwrap();
        let html = render_index(&store, Edition::Full.features());
        assert!(html.contains(r#"data-week="1" data-day="1" data-index="0" checked"#));
        assert!(html.contains(r#"data-week="1" data-day="1" data-index="1" />"#));
        assert!(html.contains(&format!("1 of {} tasks completed", store.total_tasks())));
    }

    #[test]
    fn export_link_is_a_plain_anchor() {
        let html = render_index(&store(), Edition::Full.features());
        assert!(html.contains(r#"<a href="/api/export" download class="button ghost">Export progress</a>"#));
        assert!(!html.contains("download><button"));
    }

    #[test]
    fn selected_week_is_active() {
        let mut store = store();
        store.select_week(3).unwrap();
        let html = render_index(&store, Edition::Full.features());
        assert!(html.contains(r#"class="week-content active" id="week-3""#));
        assert!(html.contains(r#"class="week-content" id="week-1""#));
    }

    #[test]
    fn baseline_omits_bookmarks_notes_and_search() {
        let html = render_index(&store(), Edition::Baseline.features());
        assert!(!html.contains("bookmark-day"));
        assert!(!html.contains("day-note"));
        assert!(!html.contains("search-input"));

        let full = render_index(&store(), Edition::Full.features());
        assert!(full.contains("bookmark-day"));
        assert!(full.contains("day-note"));
        assert!(full.contains("search-input"));
    }

    #[test]
    fn notes_and_task_text_are_escaped() {
        let plan = Arc::new(StudyPlan {
            title: "Plan".to_string(),
            weeks: vec![Week {
                title: "W".to_string(),
                days: vec![Day {
                    title: "D".to_string(),
                    tasks: vec!["<b>bold</b>".to_string()],
                }],
            }],
        });
        let mut store = ProgressStore::new(plan);
        store
            .set_note(DayKey::new(1, 1), "</textarea><script>")
            .unwrap();
        let html = render_index(&store, Edition::Full.features());
        assert!(html.contains("&lt;b&gt;bold&lt;/b&gt;"));
        assert!(html.contains("&lt;/textarea&gt;&lt;script&gt;"));
        assert!(!html.contains("<b>bold</b>"));
    }
}
