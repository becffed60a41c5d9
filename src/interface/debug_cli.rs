//! 文字 CLI：读取 stdin → 解析命令 → 转成游戏事件

use bevy::app::AppExit;
use bevy::prelude::*;
use once_cell::sync::Lazy;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::character::{components::Player, events::*};
use crate::core::{events::LogEvent, states::AppState};
use crate::data::{ItemAssets, schema::{ItemEntry, ItemList}};
use crate::equipment::events::{EquipEvent, UnequipEvent};
use crate::inventory::events::{GiveItemEvent, ListInventoryEvent, TakeItemEvent};

static CLI_BUFFER: Lazy<Arc<Mutex<VecDeque<String>>>> =
    Lazy::new(|| Arc::new(Mutex::new(VecDeque::new())));

const HELP: &str = "命令列表:
  help                   查看帮助
  status                 查看当前状态
  exit / quit            退出程序
  items                  列出所有物品模板
  items <token>          用 id / uuid / 名称 查询单个物品
  give <id> [count]      给予物品
  inventory / inv        查看背包
  drop <slot>            丢弃背包某格的物品
  equip <slot> <index>   把背包第 index 格的物品装备到 slot
  unequip <slot>         卸下装备放回背包
  stats                  查看属性
  sheet                  以 JSON 输出属性
  inc <stat> / dec <stat> 加点 / 减点";

/// 插件入口
pub struct DebugCliPlugin;
impl Plugin for DebugCliPlugin {
    fn build(&self, app: &mut App) {
        {
            let buffer = CLI_BUFFER.clone();
            std::thread::spawn(move || {
                use std::io::{self, BufRead};
                let stdin = io::stdin();
                for line in stdin.lock().lines().map_while(Result::ok) {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    if let Ok(mut buf) = buffer.lock() {
                        buf.push_back(line.to_string());
                    }
                }
            });
        }
        app
            // 事件：原始输入行
            .add_event::<CliLine>()
            // 每帧从 buffer 取出所有命令行写入事件
            .add_systems(Update, read_stdin)
            // 仅在 InGame 处理命令
            .add_systems(
                Update,
                execute_cli_commands.run_if(in_state(AppState::InGame)),
            );
    }
}

/* ---------------------------- 事件与枚举 ---------------------------- */

/// 终端敲的一整行
#[derive(Event)]
struct CliLine(String);

/// 我们支持的命令
#[derive(Debug, PartialEq)]
enum Command {
    Help,
    Status,
    Exit,
    Items(Option<String>), // None=全部；Some(token)=按 id/uuid/name 查询
    Give { id: String, count: u32 },
    Inventory,
    Drop { slot: usize },
    Equip { slot: String, index: usize },
    Unequip { slot: String },
    Stats { as_json: bool },
    Increase(String),
    Decrease(String),
    /// 参数缺失或格式错误，附带用法
    Usage(&'static str),
    Unsupported(String),
}

/* ---------------------------- 读取 stdin ---------------------------- */

fn read_stdin(mut writer: EventWriter<CliLine>) {
    let Ok(mut buffer) = CLI_BUFFER.lock() else {
        return;
    };
    while let Some(line) = buffer.pop_front() {
        writer.write(CliLine(line));
    }
}

/* ---------------------------- 命令执行 ---------------------------- */

#[allow(clippy::too_many_arguments)]
fn execute_cli_commands(
    mut line_reader: EventReader<CliLine>,
    mut app_exit: EventWriter<AppExit>,
    mut log: EventWriter<LogEvent>,
    state: Res<State<AppState>>,
    item_assets: Res<ItemAssets>,
    lists: Res<Assets<ItemList>>,
    players: Query<Entity, With<Player>>,
    mut ev_give: EventWriter<GiveItemEvent>,
    mut ev_list: EventWriter<ListInventoryEvent>,
    mut ev_take: EventWriter<TakeItemEvent>,
    mut ev_equip: EventWriter<EquipEvent>,
    mut ev_unequip: EventWriter<UnequipEvent>,
    mut ev_increase: EventWriter<IncreaseStatistic>,
    mut ev_decrease: EventWriter<DecreaseStatistic>,
    mut ev_show: EventWriter<ShowStats>,
) {
    let player = players.single().ok();

    for CliLine(input) in line_reader.read() {
        match parse_command(input) {
            Command::Help => {
                log.write(LogEvent(HELP.into()));
            }

            Command::Status => {
                let cnt = item_assets.list(&lists).map_or(0, |list| list.items.len());
                log.write(LogEvent(format!(
                    "State: {:?}, Items Loaded: {}",
                    state.get(),
                    cnt
                )));
            }

            Command::Exit => {
                log.write(LogEvent("Bye~".into()));
                app_exit.write(AppExit::Success);
            }

            Command::Items(token) => {
                let Some(list) = item_assets.list(&lists) else {
                    log.write(LogEvent("物品表尚未加载".into()));
                    continue;
                };
                match token {
                    None => {
                        for entry in &list.items {
                            let uuid = uuid_from_id(&entry.id);
                            log.write(LogEvent(format!(
                                "{} | {} | {}",
                                uuid, entry.id, entry.name
                            )));
                        }
                    }
                    Some(t) => match find_entry(&list.items, &t) {
                        Some(e) => {
                            log.write(LogEvent(describe_entry(e)));
                        }
                        None => {
                            log.write(LogEvent("未找到匹配物品".into()));
                        }
                    },
                }
            }

            Command::Give { id, count } => {
                ev_give.write(GiveItemEvent { id, count });
            }

            Command::Inventory => {
                ev_list.write(ListInventoryEvent);
            }

            Command::Stats { as_json } => {
                ev_show.write(ShowStats {
                    entity: None,
                    as_json,
                });
            }

            Command::Increase(name) => {
                ev_increase.write(IncreaseStatistic { entity: None, name });
            }

            Command::Decrease(name) => {
                ev_decrease.write(DecreaseStatistic { entity: None, name });
            }

            Command::Usage(usage) => {
                log.write(LogEvent(format!("用法: {usage}")));
            }

            Command::Unsupported(cmd) => {
                log.write(LogEvent(format!("不支持的命令: {cmd}")));
            }

            // 以下命令作用于玩家实体
            cmd @ (Command::Drop { .. } | Command::Equip { .. } | Command::Unequip { .. }) => {
                let Some(player) = player else {
                    log.write(LogEvent("没有玩家实体".into()));
                    continue;
                };
                match cmd {
                    Command::Drop { slot } => {
                        ev_take.write(TakeItemEvent {
                            container: player,
                            key: slot.into(),
                        });
                    }
                    Command::Equip { slot, index } => {
                        ev_equip.write(EquipEvent {
                            wearer: player,
                            slot,
                            index,
                        });
                    }
                    Command::Unequip { slot } => {
                        ev_unequip.write(UnequipEvent {
                            wearer: player,
                            slot,
                        });
                    }
                    _ => {}
                }
            }
        }
    }
}

/* ---------------------------- 工具函数 ---------------------------- */

fn parse_command(input: &str) -> Command {
    let mut parts = input.split_whitespace();
    let cmd = parts.next().unwrap_or("").to_lowercase();
    match cmd.as_str() {
        "help" | "h" | "?" => Command::Help,
        "status" | "s" => Command::Status,
        "exit" | "quit" | "q" => Command::Exit,
        "items" | "item" | "i" => {
            let token = parts.next().map(|s| s.to_string());
            Command::Items(token)
        }
        "give" => {
            let Some(id) = parts.next() else {
                return Command::Usage("give <id> [count]");
            };
            match parts.next().map(str::parse::<u32>) {
                None => Command::Give { id: id.into(), count: 1 },
                Some(Ok(count)) if count > 0 => Command::Give { id: id.into(), count },
                Some(_) => Command::Usage("give <id> [count]"),
            }
        }
        "inventory" | "inv" => Command::Inventory,
        "drop" => match parts.next().map(str::parse::<usize>) {
            Some(Ok(slot)) => Command::Drop { slot },
            _ => Command::Usage("drop <slot>"),
        },
        "equip" => {
            let slot = parts.next();
            let index = parts.next().map(str::parse::<usize>);
            match (slot, index) {
                (Some(slot), Some(Ok(index))) => Command::Equip {
                    slot: slot.into(),
                    index,
                },
                _ => Command::Usage("equip <slot> <index>"),
            }
        }
        "unequip" => match parts.next() {
            Some(slot) => Command::Unequip { slot: slot.into() },
            None => Command::Usage("unequip <slot>"),
        },
        "stats" => Command::Stats { as_json: false },
        "sheet" => Command::Stats { as_json: true },
        "inc" => match parts.next() {
            Some(name) => Command::Increase(name.into()),
            None => Command::Usage("inc <stat>"),
        },
        "dec" => match parts.next() {
            Some(name) => Command::Decrease(name.into()),
            None => Command::Usage("dec <stat>"),
        },
        other => Command::Unsupported(other.into()),
    }
}

/// 按 id / 名称 / uuid 匹配
fn find_entry<'a>(entries: &'a [ItemEntry], token: &str) -> Option<&'a ItemEntry> {
    let token = token.to_lowercase();
    entries.iter().find(|e| {
        e.id.eq_ignore_ascii_case(&token)
            || e.name.eq_ignore_ascii_case(&token)
            || uuid_from_id(&e.id).to_string() == token
    })
}

fn describe_entry(e: &ItemEntry) -> String {
    let slots = if e.slots.is_empty() {
        "-".to_string()
    } else {
        e.slots.join(", ")
    };
    format!(
        "==================================================
UUID  : {}
ID    : {}
Name  : {}
Type  : {}
Bulk  : {}
Weight: {}
Stack : {}
Slots : {}
==================================================",
        uuid_from_id(&e.id),
        e.id,
        e.name,
        e.item_type(),
        e.bulk,
        e.weight,
        e.max_stack,
        slots
    )
}

fn uuid_from_id(id: &str) -> Uuid {
    // 用固定 namespace + id 字节生成版本 5 UUID，保证可重复得到同一值
    Uuid::new_v5(&Uuid::NAMESPACE_OID, id.as_bytes())
}
