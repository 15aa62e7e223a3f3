use macroquad::prelude::*;
use slithers::{AgentConfig, Cell, Direction, GameConfig, GridWorld, TabularAgent};
use std::time::{SystemTime, UNIX_EPOCH};

const SCORE_AREA_HEIGHT: f32 = 60.0;
const SCORE_TEXT_SIZE: f32 = 40.0;
const CELL_SIZE: i32 = 48;
const GRID_SIZE: usize = 10; // cells
const HUMAN_TICK_SPEED: f32 = 0.2; // seconds
const AGENT_TICK_SPEED: f32 = 0.08; // seconds
const MODEL_PATH: &str = "input/snake_agent.bin";

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mode {
    Menu,
    Human,
    Agent,
}

fn window_conf() -> Conf {
    Conf {
        window_title: "slithers".to_owned(),
        window_width: GRID_SIZE as i32 * CELL_SIZE,
        window_height: (SCORE_AREA_HEIGHT as i32) + GRID_SIZE as i32 * CELL_SIZE,
        window_resizable: false,
        ..Default::default()
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    let mut world = match GridWorld::with_seed(GameConfig::new(GRID_SIZE), seed) {
        Ok(world) => world,
        Err(e) => {
            tracing::error!("cannot build the board: {}", e);
            return;
        }
    };
    let mut agent = match TabularAgent::with_seed(AgentConfig::default(), GRID_SIZE, seed) {
        Ok(agent) => agent,
        Err(e) => {
            tracing::error!("cannot build the agent: {}", e);
            return;
        }
    };
    if let Err(e) = agent.load(MODEL_PATH) {
        tracing::warn!("no trained model at {}, the agent will play blind: {}", MODEL_PATH, e);
    }

    let mut mode = Mode::Menu;
    let mut pending: Option<Direction> = None;
    let mut time_accumulator: f32 = 0.0; // seconds

    loop {
        clear_background(LIGHTGRAY);

        match mode {
            Mode::Menu => mode = draw_menu(),
            Mode::Human | Mode::Agent => {
                if mode == Mode::Human {
                    if let Some(direction) = read_direction() {
                        pending = Some(direction);
                    }
                }

                let tick_speed = if mode == Mode::Human { HUMAN_TICK_SPEED } else { AGENT_TICK_SPEED };
                time_accumulator += get_frame_time();
                while time_accumulator >= tick_speed && !world.is_terminal() {
                    time_accumulator -= tick_speed;

                    let current = world.direction();
                    let action = match mode {
                        Mode::Agent => agent.exploit(&world.observe(), current),
                        _ => pending.take().unwrap_or(current),
                    };
                    // a reversal from the keyboard just keeps the snake going straight
                    if let Err(e) = world.step(action) {
                        tracing::debug!("{}, keeping course", e);
                        if let Err(e) = world.step(current) {
                            tracing::error!("snake cannot advance: {}", e);
                        }
                    }
                }

                draw_world(&world);

                if world.is_terminal() {
                    if let Some(reason) = world.terminal_reason() {
                        tracing::info!(length = world.snake_len(), steps = world.steps(), "game over: {}", reason);
                    }
                    world.reset();
                    pending = None;
                    time_accumulator = 0.0;
                    mode = Mode::Menu;
                }
            }
        }

        next_frame().await
    }
}

fn read_direction() -> Option<Direction> {
    // use WASD or arrow keys for input
    if is_key_pressed(KeyCode::Up) || is_key_pressed(KeyCode::W) {
        Some(Direction::Up)
    } else if is_key_pressed(KeyCode::Down) || is_key_pressed(KeyCode::S) {
        Some(Direction::Down)
    } else if is_key_pressed(KeyCode::Right) || is_key_pressed(KeyCode::D) {
        Some(Direction::Right)
    } else if is_key_pressed(KeyCode::Left) || is_key_pressed(KeyCode::A) {
        Some(Direction::Left)
    } else {
        None
    }
}

fn draw_world(world: &GridWorld) {
    let screen_w = screen_width();
    let screen_h = screen_height();

    // score area

    let score_area = Rect::new(0.0, 0.0, screen_w, SCORE_AREA_HEIGHT);
    draw_rectangle(score_area.x, score_area.y, score_area.w, score_area.h, Color::new(0.1, 0.1, 0.2, 1.0));
    draw_line(score_area.x, score_area.h, screen_w, score_area.h, 2.0, BLACK);

    let score_text = format!("Length: {}", world.snake_len());
    let text_dims = measure_text(&score_text, None, SCORE_TEXT_SIZE as u16, 1.0);
    draw_text(
        &score_text,
        score_area.w / 2.0 - text_dims.width / 2.0,
        score_area.y + score_area.h / 2.0 + text_dims.height / 2.0,
        SCORE_TEXT_SIZE,
        WHITE,
    );

    // game area

    let game_area = Rect::new(0.0, score_area.h, screen_w, screen_h - score_area.h);
    let size = world.grid_size() as i32;
    let cell_width = game_area.w / size as f32;
    let cell_height = game_area.h / size as f32;
    let cell_fill_border: f32 = 2.0;

    for y in 0..size {
        for x in 0..size {
            let (outer, inner) = match world.cell((x, y)) {
                Cell::SnakeHead => (DARKBLUE, BLUE),
                Cell::SnakeBody => (DARKBLUE, SKYBLUE),
                Cell::GoodFood => (DARKGREEN, GREEN),
                Cell::BadFood => (Color::new(0.5, 0.0, 0.0, 1.0), RED),
                Cell::Empty | Cell::Wall => continue,
            };
            let cell_x = game_area.x + x as f32 * cell_width;
            let cell_y = game_area.y + y as f32 * cell_height;
            draw_rectangle(cell_x, cell_y, cell_width - 1.0, cell_height - 1.0, outer);
            draw_rectangle(
                cell_x + cell_fill_border,
                cell_y + cell_fill_border,
                (cell_width - 1.0) - cell_fill_border * 2.0,
                (cell_height - 1.0) - cell_fill_border * 2.0,
                inner,
            );
        }
    }

    let grid_line_color = Color::new(0.4, 0.4, 0.4, 0.3);
    for i in 1..size {
        let x = game_area.x + i as f32 * cell_width;
        draw_line(x, game_area.y, x, game_area.y + game_area.h, 1.0, grid_line_color);
        let y = game_area.y + i as f32 * cell_height;
        draw_line(game_area.x, y, game_area.x + game_area.w, y, 1.0, grid_line_color);
    }
}

struct Button {
    rect: Rect,
    text: &'static str,
}

impl Button {
    fn new(x: f32, y: f32, w: f32, h: f32, text: &'static str) -> Self {
        Self {
            rect: Rect::new(x, y, w, h),
            text,
        }
    }

    fn draw_and_check_click(&self) -> bool {
        let mouse_pos = mouse_position();
        let mouse_over = self.rect.contains(vec2(mouse_pos.0, mouse_pos.1));

        let color = if mouse_over {
            Color::from_rgba(100, 100, 120, 255)
        } else {
            Color::from_rgba(80, 80, 100, 255)
        };

        draw_rectangle(self.rect.x, self.rect.y, self.rect.w, self.rect.h, color);
        let text_dims = measure_text(self.text, None, 30, 1.0);
        let text_x = self.rect.x + (self.rect.w - text_dims.width) / 2.0;
        let text_y = self.rect.y + (self.rect.h - text_dims.height) / 2.0 + text_dims.offset_y;
        draw_text(self.text, text_x, text_y, 30.0, WHITE);
        mouse_over && is_mouse_button_pressed(MouseButton::Left)
    }
}

fn draw_menu() -> Mode {
    let center_x = screen_width() / 2.0;
    let center_y = screen_height() / 2.0;
    let button_width = 250.0;
    let button_height = 60.0;
    let spacing = 20.0;

    let human_button = Button::new(
        center_x - button_width / 2.0,
        center_y - button_height - spacing / 2.0,
        button_width,
        button_height,
        "Human Player",
    );
    let agent_button = Button::new(
        center_x - button_width / 2.0,
        center_y + spacing / 2.0,
        button_width,
        button_height,
        "RL Agent",
    );

    let title = "Select Player";
    let title_dims = measure_text(title, None, 50, 1.0);
    draw_text(title, center_x - title_dims.width / 2.0, center_y - 100.0, 50.0, BLACK);

    if human_button.draw_and_check_click() {
        Mode::Human
    } else if agent_button.draw_and_check_click() {
        Mode::Agent
    } else {
        Mode::Menu
    }
}
