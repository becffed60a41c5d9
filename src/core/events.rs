use bevy::prelude::*;

/// 面向玩家的提示信息，由 `forward_log_event` 打印
#[derive(Event, Debug, Clone)]
pub struct LogEvent(pub String);

pub fn forward_log_event(mut reader: EventReader<LogEvent>) {
    for e in reader.read() {
        println!("> {}", e.0);
    }
}

/// 独占系统里一次性取出某类事件
pub fn drain_events<E: Event>(world: &mut World) -> Vec<E> {
    world
        .get_resource_mut::<Events<E>>()
        .map(|mut events| events.drain().collect())
        .unwrap_or_default()
}

/// 独占系统里发送一条提示信息
pub fn send_log(world: &mut World, message: impl Into<String>) {
    world.send_event(LogEvent(message.into()));
}
